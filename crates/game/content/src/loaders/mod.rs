//! Content loaders for reading realm data from files.
//!
//! Every loader has a path-based `load` and a string-based `parse`, so content
//! can come from disk or be bundled into a binary with `include_str!`.

pub mod config;
pub mod templates;
pub mod world;

pub use config::ConfigLoader;
pub use templates::{TemplateLoader, TemplateRegistry};
pub use world::{LoadedWorld, WorldLoader, WorldSpec};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
