//! League node library: configuration, shared state, HTTP API, and the
//! node-local user directory standing in for the Identity collaborator.

pub mod api;
mod catalog;
mod directory;
mod node;

pub use catalog::{catalog_from_file, default_catalog};
pub use directory::UserDirectory;
pub use node::{LeagueConfig, LeagueNode, NodeState};
