//! Evolution chain payloads and their single-branch linearization.

use serde::{Deserialize, Serialize};

use crate::pokemon::NamedAPIResource;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EvolutionEntry {
    pub id: u32,
    pub name: String,
}

/// `GET /pokemon-species/{id}`
#[derive(Debug, Deserialize, Clone)]
pub struct SpeciesDetail {
    pub evolution_chain: EvolutionChainRef,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvolutionChainRef {
    pub url: String,
}

/// `GET /evolution-chain/{id}`
#[derive(Debug, Deserialize, Clone)]
pub struct EvolutionChainDetail {
    pub chain: ChainLink,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainLink {
    pub species: NamedAPIResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("species url has no numeric id: {0}")]
pub struct InvalidSpeciesUrl(pub String);

/// Walks the chain from its root, always taking the first evolution.
///
/// Branching evolutions past the first child are dropped: `A -> [B, C], B -> [D]`
/// yields `[A, B, D]`.
pub fn linearize(chain: &ChainLink) -> Result<Vec<EvolutionEntry>, InvalidSpeciesUrl> {
    let mut entries = Vec::new();
    let mut current = Some(chain);

    while let Some(link) = current {
        entries.push(EvolutionEntry {
            id: species_id(&link.species.url)?,
            name: link.species.name.clone(),
        });
        current = link.evolves_to.first();
    }

    Ok(entries)
}

/// Id taken from the second-to-last `/` segment, e.g. `.../pokemon-species/133/`.
pub fn species_id(url: &str) -> Result<u32, InvalidSpeciesUrl> {
    let mut segments = url.rsplit('/');
    segments.next();
    segments
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| InvalidSpeciesUrl(url.to_string()))
}
