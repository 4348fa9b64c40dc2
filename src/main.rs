use pokedex_data::{
    Config, ConfigError, FileStore, InMemoryStore, KeyValueStore, PokemonService, PokemonStore,
    ServiceError, StorageError,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    if config.storage.is_file() {
        Ok(Arc::new(FileStore::open(&config.storage.path)?))
    } else {
        tracing::info!("Using in-memory storage; nothing will persist");
        Ok(Arc::new(InMemoryStore::new()))
    }
}

async fn run(config: Config, search: Option<String>) -> Result<(), AppError> {
    let storage = open_storage(&config)?;
    let service = PokemonService::new(&config.pokemon)?;
    let store = PokemonStore::new(service, storage, &config.store);

    store.load_from_cache()?;
    store.load_favorites()?;
    tracing::info!(
        "Loaded {} Pokémon and {} favorites from storage",
        store.total_items(),
        store.favorites().len()
    );

    store.fetch_pokemon(1, config.pokemon.page_limit).await;
    if let Some(error) = store.error() {
        tracing::error!("{}", error);
    }

    if let Some(term) = search {
        store.set_search_term(term);
    }

    let state = store.snapshot();
    tracing::info!(
        "Page {}/{} of {} matching Pokémon",
        state.current_page,
        state.total_pages(),
        state.filtered_pokemon().len()
    );
    for pokemon in state.paginated_pokemon() {
        let marker = if state.is_favorite(pokemon.id) { "*" } else { " " };
        println!(
            "{marker} #{:<4} {:<14} {}",
            pokemon.id,
            pokemon.name,
            pokemon.types.join("/")
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.logging.json);

    let search = std::env::args().nth(1);
    if let Err(e) = run(config, search).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
