pub mod client;
pub mod config;
pub mod evolution;
pub mod pagination;
pub mod pokemon;
pub mod service;
pub mod storage;
pub mod store;

pub use client::*;
pub use config::*;
pub use evolution::*;
pub use pagination::*;
pub use pokemon::*;
pub use service::*;
pub use storage::*;
pub use store::*;
