//! Domain records handed to the store, and the PokeAPI response shapes they are built from.

use serde::{Deserialize, Serialize};

/// Flattened Pokémon record. Re-fetching replaces a record, it is never patched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub image: Option<String>,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub species: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

impl Pokemon {
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }
}

// Upstream payloads. Only the fields the transform reads are declared.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NamedAPIResource {
    #[serde(default)]
    pub name: String,
    pub url: String,
}

/// `GET /pokemon?limit=&offset=`
#[derive(Debug, Deserialize, Clone)]
pub struct PokemonPage {
    pub results: Vec<NamedAPIResource>,
}

/// `GET /pokemon/{id}`
#[derive(Debug, Deserialize, Clone)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    pub sprites: PokemonSprites,
    pub types: Vec<PokemonType>,
    pub stats: Vec<PokemonStat>,
    pub species: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonSprites {
    pub front_default: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonType {
    pub r#type: NamedAPIResource,
}

/// `GET /type/{name}`
#[derive(Debug, Deserialize, Clone)]
pub struct TypeDetail {
    pub pokemon: Vec<TypePokemon>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TypePokemon {
    pub pokemon: NamedAPIResource,
}

impl From<PokemonDetail> for Pokemon {
    fn from(detail: PokemonDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name,
            image: detail.sprites.front_default,
            types: detail.types.into_iter().map(|t| t.r#type.name).collect(),
            stats: detail
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            species: detail.species.url,
        }
    }
}
