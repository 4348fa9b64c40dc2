//! PokeAPI operations returning domain records.

use std::time::Duration;
use tokio::task::JoinSet;

use crate::client::{RemoteClient, TransportError};
use crate::config::PokemonConfig;
use crate::evolution::{self, EvolutionChainDetail, EvolutionEntry, SpeciesDetail};
use crate::pokemon::{NamedAPIResource, Pokemon, PokemonDetail, PokemonPage, TypeDetail};

pub const POKEMON_FALLBACK_MESSAGE: &str = "Failed to fetch Pokemon data";
pub const EVOLUTION_FALLBACK_MESSAGE: &str = "Failed to fetch evolution chain";

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
    #[source]
    source: Option<TransportError>,
}

impl ServiceError {
    /// Keeps the cause's message, or `fallback` when the cause has none.
    pub fn wrap(cause: TransportError, fallback: &str) -> Self {
        let message = cause.to_string();
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        Self {
            message,
            source: Some(cause),
        }
    }

    /// The response decoded but did not contain what the operation needed.
    pub fn payload(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn transport(&self) -> Option<&TransportError> {
        self.source.as_ref()
    }
}

fn pokemon_error(cause: TransportError) -> ServiceError {
    ServiceError::wrap(cause, POKEMON_FALLBACK_MESSAGE)
}

fn evolution_error(cause: TransportError) -> ServiceError {
    ServiceError::wrap(cause, EVOLUTION_FALLBACK_MESSAGE)
}

#[derive(Debug, Clone)]
pub struct PokemonService {
    client: RemoteClient,
    detail_delay: Duration,
}

impl PokemonService {
    pub fn new(config: &PokemonConfig) -> Result<Self, ServiceError> {
        let client = RemoteClient::new(config).map_err(pokemon_error)?;
        Ok(Self::with_client(client, config.detail_delay()))
    }

    pub fn with_client(client: RemoteClient, detail_delay: Duration) -> Self {
        Self {
            client,
            detail_delay,
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Fetches one page of references, then every detail concurrently.
    ///
    /// All-or-nothing: the first failed detail, in completion order, aborts the
    /// outstanding requests and fails the whole call. Results keep the order of the page.
    pub async fn get_pokemon_list(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Pokemon>, ServiceError> {
        let page: PokemonPage = self
            .client
            .get(&format!("/pokemon?limit={limit}&offset={offset}"))
            .await
            .map_err(pokemon_error)?;

        tracing::debug!(
            "Fetching details for {} Pokémon (offset {})",
            page.results.len(),
            offset
        );

        let count = page.results.len();
        let mut tasks = JoinSet::new();
        for (index, reference) in page.results.into_iter().enumerate() {
            let client = self.client.clone();
            let delay = self
                .detail_delay
                .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            tasks.spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let result = client
                    .get::<PokemonDetail>(&reference.url)
                    .await
                    .map(Pokemon::from);
                (index, result)
            });
        }

        // Dropping the set aborts whatever is still running.
        let mut slots: Vec<Option<Pokemon>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| pokemon_error(TransportError::Network(e.to_string())))?;
            match result {
                Ok(p) => slots[index] = Some(p),
                Err(e) => {
                    tasks.abort_all();
                    return Err(pokemon_error(e));
                }
            }
        }
        let pokemon: Vec<Pokemon> = slots.into_iter().flatten().collect();

        tracing::debug!("Fetched {} Pokémon", pokemon.len());
        Ok(pokemon)
    }

    /// `name_or_id` is anything `/pokemon/{x}` accepts.
    pub async fn get_pokemon(&self, name_or_id: &str) -> Result<Pokemon, ServiceError> {
        let detail: PokemonDetail = self
            .client
            .get(&format!("/pokemon/{name_or_id}"))
            .await
            .map_err(pokemon_error)?;
        Ok(detail.into())
    }

    pub async fn get_pokemon_by_type(
        &self,
        type_name: &str,
    ) -> Result<Vec<NamedAPIResource>, ServiceError> {
        let detail: TypeDetail = self
            .client
            .get(&format!("/type/{type_name}"))
            .await
            .map_err(pokemon_error)?;
        Ok(detail.pokemon.into_iter().map(|p| p.pokemon).collect())
    }

    /// Species record -> its evolution chain -> first-branch linearization.
    pub async fn get_evolution_chain(
        &self,
        species_url: &str,
    ) -> Result<Vec<EvolutionEntry>, ServiceError> {
        let species: SpeciesDetail = self
            .client
            .get(species_url)
            .await
            .map_err(evolution_error)?;
        self.linearized_chain(&species.evolution_chain.url).await
    }

    pub async fn get_evolution_chain_by_id(
        &self,
        id: u32,
    ) -> Result<Vec<EvolutionEntry>, ServiceError> {
        self.linearized_chain(&format!("/evolution-chain/{id}")).await
    }

    async fn linearized_chain(&self, path: &str) -> Result<Vec<EvolutionEntry>, ServiceError> {
        let detail: EvolutionChainDetail =
            self.client.get(path).await.map_err(evolution_error)?;
        evolution::linearize(&detail.chain).map_err(|e| ServiceError::payload(e.to_string()))
    }
}
