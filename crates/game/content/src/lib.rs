//! Data-driven content definitions and loaders.
//!
//! This crate reads static content from data files:
//! - Plan templates (RON catalog of named phases and actions)
//! - Starting worlds (RON: locations, actors with bodies, items and where they lie)
//! - Core configuration (TOML)
//!
//! Content feeds the realm at start-up and never appears in effect state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, LoadedWorld, TemplateLoader, TemplateRegistry, WorldLoader, WorldSpec,
};
