//! Shared browsing state: the fetched list, favorites, filters and the page cursor.
//!
//! `PokemonStore` is a cheap-to-clone handle; every clone sees the same state.
//! Fetch failures never escape the store, they land in [`PokemonState::error`].
//! Derived views are recomputed from the current state on every read, and
//! [`PokemonStore::subscribe`] notifies watchers whenever the state changes.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::evolution::EvolutionEntry;
use crate::pagination;
use crate::pokemon::Pokemon;
use crate::service::PokemonService;
use crate::storage::{self, KeyValueStore, StorageError};

pub const POKEMON_LIST_KEY: &str = "pokemonList";
pub const FAVORITES_KEY: &str = "favorites";
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch Pokemon. Please try again later.";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct PokemonState {
    pub pokemon_list: Vec<Pokemon>,
    pub favorites: Vec<u32>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub search_term: String,
    pub selected_types: BTreeSet<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl PokemonState {
    pub fn new(page_size: usize) -> Self {
        Self {
            pokemon_list: Vec::new(),
            favorites: Vec::new(),
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
            search_term: String::new(),
            selected_types: BTreeSet::new(),
            is_loading: false,
            error: None,
        }
    }

    fn matches(&self, pokemon: &Pokemon, needle: &str) -> bool {
        pokemon.name.to_lowercase().contains(needle)
            && (self.selected_types.is_empty()
                || self.selected_types.iter().any(|t| pokemon.has_type(t)))
    }

    /// Entries whose name contains the search term (case-insensitive) and that have
    /// at least one selected type, in list order.
    pub fn filtered_pokemon(&self) -> Vec<&Pokemon> {
        let needle = self.search_term.to_lowercase();
        self.pokemon_list
            .iter()
            .filter(|p| self.matches(p, &needle))
            .collect()
    }

    pub fn paginated_pokemon(&self) -> Vec<&Pokemon> {
        let filtered = self.filtered_pokemon();
        pagination::paginate(&filtered, self.current_page, self.page_size).to_vec()
    }

    pub fn favorite_pokemon(&self) -> Vec<&Pokemon> {
        self.pokemon_list
            .iter()
            .filter(|p| self.favorites.contains(&p.id))
            .collect()
    }

    /// Pages available for the filtered view.
    pub fn total_pages(&self) -> usize {
        pagination::total_pages(self.filtered_pokemon().len(), self.page_size)
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorites.contains(&id)
    }
}

impl Default for PokemonState {
    fn default() -> Self {
        Self::new(StoreConfig::default().page_size)
    }
}

struct StoreInner {
    state: watch::Sender<PokemonState>,
    service: PokemonService,
    storage: Arc<dyn KeyValueStore>,
}

/// Clears `is_loading` when dropped, including when the fetch future is cancelled.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<PokemonState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.is_loading = false);
    }
}

#[derive(Clone)]
pub struct PokemonStore {
    inner: Arc<StoreInner>,
}

impl PokemonStore {
    pub fn new(
        service: PokemonService,
        storage: Arc<dyn KeyValueStore>,
        config: &StoreConfig,
    ) -> Self {
        let (state, _) = watch::channel(PokemonState::new(config.page_size));
        Self {
            inner: Arc::new(StoreInner {
                state,
                service,
                storage,
            }),
        }
    }

    pub fn service(&self) -> &PokemonService {
        &self.inner.service
    }

    pub fn subscribe(&self) -> watch::Receiver<PokemonState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> PokemonState {
        self.inner.state.borrow().clone()
    }

    pub fn pokemon_list(&self) -> Vec<Pokemon> {
        self.inner.state.borrow().pokemon_list.clone()
    }

    pub fn favorites(&self) -> Vec<u32> {
        self.inner.state.borrow().favorites.clone()
    }

    pub fn current_page(&self) -> usize {
        self.inner.state.borrow().current_page
    }

    pub fn total_items(&self) -> usize {
        self.inner.state.borrow().total_items
    }

    pub fn search_term(&self) -> String {
        self.inner.state.borrow().search_term.clone()
    }

    pub fn selected_types(&self) -> BTreeSet<String> {
        self.inner.state.borrow().selected_types.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn filtered_pokemon(&self) -> Vec<Pokemon> {
        let state = self.inner.state.borrow();
        state.filtered_pokemon().into_iter().cloned().collect()
    }

    pub fn paginated_pokemon(&self) -> Vec<Pokemon> {
        let state = self.inner.state.borrow();
        state.paginated_pokemon().into_iter().cloned().collect()
    }

    pub fn favorite_pokemon(&self) -> Vec<Pokemon> {
        let state = self.inner.state.borrow();
        state.favorite_pokemon().into_iter().cloned().collect()
    }

    pub fn total_pages(&self) -> usize {
        self.inner.state.borrow().total_pages()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.inner.state.send_if_modified(|state| {
            if state.search_term == term {
                return false;
            }
            state.search_term = term;
            true
        });
    }

    pub fn set_selected_types<I, S>(&self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: BTreeSet<String> = types.into_iter().map(Into::into).collect();
        self.inner.state.send_if_modified(|state| {
            if state.selected_types == types {
                return false;
            }
            state.selected_types = types;
            true
        });
    }

    /// Adds the type to the filter, or removes it if already selected.
    pub fn toggle_selected_type(&self, type_name: &str) {
        self.inner.state.send_modify(|state| {
            if !state.selected_types.remove(type_name) {
                state.selected_types.insert(type_name.to_string());
            }
        });
    }

    /// Page 0 is ignored.
    pub fn set_current_page(&self, page: usize) {
        if page == 0 {
            return;
        }
        self.inner.state.send_if_modified(|state| {
            let changed = state.current_page != page;
            state.current_page = page;
            changed
        });
    }

    /// Back to an empty state. Persisted data is left alone.
    ///
    /// `is_loading` survives the reset so an in-flight fetch still blocks new ones.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            let loading = state.is_loading;
            *state = PokemonState::new(state.page_size);
            state.is_loading = loading;
        });
    }

    /// Populates the list once per session.
    ///
    /// Returns immediately while another fetch is in flight or when the list already
    /// holds entries, whatever `page` and `limit` are. Failures are reported through
    /// the `error` field and leave the list as it was.
    pub async fn fetch_pokemon(&self, page: u32, limit: u32) {
        let started = self.inner.state.send_if_modified(|state| {
            if state.is_loading || !state.pokemon_list.is_empty() {
                return false;
            }
            state.is_loading = true;
            state.error = None;
            true
        });
        if !started {
            tracing::debug!("Skipping Pokémon fetch: already loading or loaded");
            return;
        }

        let _loading = LoadingGuard {
            state: &self.inner.state,
        };
        let offset = page.saturating_sub(1).saturating_mul(limit);

        match self.inner.service.get_pokemon_list(limit, offset).await {
            Ok(fetched) => {
                tracing::info!("Fetched {} Pokémon", fetched.len());
                self.inner.state.send_modify(|state| {
                    state.pokemon_list.extend(fetched);
                    state.total_items = state.pokemon_list.len();
                });

                let error = match self.save_to_cache() {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::error!("Failed to persist Pokémon list: {}", e);
                        Some(e.to_string())
                    }
                };
                self.inner.state.send_modify(|state| state.error = error);
            }
            Err(e) => {
                tracing::error!("Error fetching Pokemon: {}", e);
                self.inner.state.send_modify(|state| {
                    state.error = Some(FETCH_ERROR_MESSAGE.to_string());
                });
            }
        }
    }

    /// Fetches with the default page and limit.
    pub async fn fetch_first_page(&self) {
        self.fetch_pokemon(DEFAULT_PAGE, DEFAULT_LIMIT).await;
    }

    /// Evolution line for a species. On failure sets `error` and returns an empty list.
    pub async fn fetch_evolution_chain(&self, species_url: &str) -> Vec<EvolutionEntry> {
        match self.inner.service.get_evolution_chain(species_url).await {
            Ok(chain) => chain,
            Err(e) => {
                tracing::error!("Error fetching evolution chain: {}", e);
                self.inner
                    .state
                    .send_modify(|state| state.error = Some(e.to_string()));
                Vec::new()
            }
        }
    }

    /// Adds `id` to favorites, or removes it if present, then persists favorites.
    pub fn toggle_favorite(&self, id: u32) -> Result<(), StorageError> {
        self.inner.state.send_modify(|state| {
            match state.favorites.iter().position(|&f| f == id) {
                Some(index) => {
                    state.favorites.remove(index);
                }
                None => state.favorites.push(id),
            }
        });
        let favorites = self.favorites();
        storage::save_json(self.inner.storage.as_ref(), FAVORITES_KEY, &favorites)
    }

    /// Seeds the list from storage. Malformed JSON is returned as an error.
    pub fn load_from_cache(&self) -> Result<(), StorageError> {
        let cached: Option<Vec<Pokemon>> =
            storage::load_json(self.inner.storage.as_ref(), POKEMON_LIST_KEY)?;
        if let Some(list) = cached {
            tracing::debug!("Loaded {} Pokémon from cache", list.len());
            self.inner.state.send_modify(|state| {
                state.total_items = list.len();
                state.pokemon_list = list;
            });
        }
        Ok(())
    }

    pub fn load_favorites(&self) -> Result<(), StorageError> {
        let stored: Option<Vec<u32>> =
            storage::load_json(self.inner.storage.as_ref(), FAVORITES_KEY)?;
        if let Some(favorites) = stored {
            self.inner
                .state
                .send_modify(|state| state.favorites = favorites);
        }
        Ok(())
    }

    fn save_to_cache(&self) -> Result<(), StorageError> {
        let state = self.inner.state.borrow();
        storage::save_json(self.inner.storage.as_ref(), POKEMON_LIST_KEY, &state.pokemon_list)
    }
}
