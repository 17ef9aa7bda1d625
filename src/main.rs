use dotenvy::dotenv;
use land_registry::{
    config::{database, fields},
    core::{
        certificate::LocalDocumentStore,
        field::{self, FieldFilter},
    },
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file
    dotenv().ok(); // Non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load seed field definitions
    let config = fields::load_default_config()
        .inspect_err(|e| error!("Failed to load field configuration: {}", e))?;

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed default field definitions
    let seeded = field::seed_field_definitions(&db, &config.fields)
        .await
        .inspect_err(|e| error!("Failed to seed field definitions: {}", e))?;

    let active = field::list_fields(
        &db,
        FieldFilter {
            active: Some(true),
            ..FieldFilter::default()
        },
    )
    .await?;
    let store = LocalDocumentStore::from_env();
    info!(
        "Land registry ready: {} new field definitions seeded, {} active, documents in {}",
        seeded,
        active.len(),
        store.root().display()
    );

    Ok(())
}
