//! A small library catalogue stored in a temporary sled database.
//!
//! Run with `RUST_LOG=docgraph=debug` to see every store round trip.

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use docgraph::{lens, Engine, EngineConfig, Entity, FieldDef, LazyRefs, ModelBuilder, Shared};

#[derive(Debug, Default, Clone, PartialEq)]
struct Author {
    id: Option<Uuid>,
    name: String,
}

impl Entity for Author {
    const COLLECTION: &'static str = "Author";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("name", lens!(name)).with_index())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Genre {
    id: Option<Uuid>,
    name: String,
}

impl Entity for Genre {
    const COLLECTION: &'static str = "Genre";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("name", lens!(name)))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Review {
    id: Option<Uuid>,
    stars: u8,
    text: String,
}

impl Entity for Review {
    const COLLECTION: &'static str = "Review";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("stars", lens!(stars)))
            .field(FieldDef::scalar("text", lens!(text)))
    }
}

#[derive(Debug, Default)]
struct Title {
    id: Option<Uuid>,
    name: String,
    added: Option<chrono::DateTime<Utc>>,
    author: Option<Author>,
    genres: Vec<Shared<Genre>>,
    reviews: LazyRefs<Review>,
}

impl Entity for Title {
    const COLLECTION: &'static str = "Title";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("name", lens!(name)).with_index())
            .field(FieldDef::scalar("added", lens!(added)))
            .field(FieldDef::owned("author", lens!(author)))
            .field(FieldDef::shared_many("genres", lens!(genres)))
            .field(FieldDef::owned_many("reviews", lens!(reviews)))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docgraph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine = Engine::open(EngineConfig::temporary("library"))?;

    for field in engine.classify::<Title>()? {
        tracing::info!(field = field.name, kind = ?field.kind, "classified field");
    }

    let mut scifi = Genre {
        name: "science fiction".into(),
        ..Default::default()
    };
    engine.store(&mut scifi).await?;

    let mut title = Title {
        id: None,
        name: "The Dispossessed".into(),
        added: Some(Utc::now()),
        author: Some(Author {
            name: "Ursula K. Le Guin".into(),
            ..Default::default()
        }),
        genres: vec![Shared::new(scifi.clone())],
        reviews: LazyRefs::from(vec![
            Review {
                stars: 5,
                text: "An ambiguous utopia.".into(),
                ..Default::default()
            },
            Review {
                stars: 4,
                text: "Slow start, great finish.".into(),
                ..Default::default()
            },
        ]),
    };
    let id = engine.store(&mut title).await?;
    tracing::info!(%id, "stored title");

    let mut loaded: Title = engine.load(id).await?;
    tracing::info!(
        name = %loaded.name,
        author = ?loaded.author.as_ref().map(|a| &a.name),
        genres = loaded.genres.len(),
        pending_reviews = loaded.reviews.pending_ids().len(),
        "loaded title"
    );

    if let Some(review) = loaded.reviews.get(&engine, 0).await? {
        tracing::info!(stars = review.stars, text = %review.text, "first review");
    }

    let report = engine.trash(&loaded).await?;
    tracing::info!(
        deleted = report.deleted.len(),
        unlinked = report.unlinked.len(),
        "trashed title"
    );

    let genre: Genre = engine.load(scifi.id.ok_or("genre was not stored")?).await?;
    tracing::info!(name = %genre.name, "shared genre survives");

    Ok(())
}
