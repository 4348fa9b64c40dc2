//! Shared test utilities.

#![allow(dead_code, unused_imports)]

pub mod mock_pokeapi;

use pokedex_data::{InMemoryStore, PokemonConfig, PokemonService, PokemonStore, StoreConfig};
use std::sync::Arc;

use mock_pokeapi::MockPokeApi;

/// Service pointed at the mock, with no stagger between detail requests.
pub fn service_for(mock: &MockPokeApi) -> PokemonService {
    PokemonService::new(&PokemonConfig {
        api_url: mock.base_url(),
        timeout: 2_000,
        detail_delay_ms: 0,
        page_limit: 100,
    })
    .expect("Failed to build service")
}

pub fn store_for(mock: &MockPokeApi, storage: InMemoryStore) -> PokemonStore {
    PokemonStore::new(
        service_for(mock),
        Arc::new(storage),
        &StoreConfig { page_size: 20 },
    )
}
