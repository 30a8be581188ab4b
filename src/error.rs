//! Error types for the map construction pipeline.
//!
//! Placement primitives on the cache report soft failures through their
//! `bool` return values; everything that aborts a build surfaces here.
//! None of these are retried internally.

use std::fmt;

/// Errors surfaced to the builder caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Two descriptors share a resource id within one group.
    DuplicateResource(String),
    /// A tile group mixes unit tiles and auto-tiles.
    HeterogeneousGroup(String),
    /// An element referenced a resource id absent from its loaded resources.
    MissingResource(String),
    /// Weighted choice over a distribution whose rates sum to zero.
    EmptyDistribution,
    /// `assign` across caches with different dimensions.
    ShapeMismatch {
        expected: (u32, u32, u32),
        found: (u32, u32, u32),
    },
    /// An image path could not be resolved on disk.
    AssetLoadFailed { path: String },
    /// Two elements were registered under the same name.
    DuplicateElement(String),
    /// An element signaled it could not complete its build.
    BuildAborted { element: String, cause: String },
    /// An operation would have broken a cache invariant past the guard
    /// checks. Indicates a bug in the core, not in caller input.
    InvariantViolated(String),
    /// Export or preview requested before `build()` completed.
    MapNotBuilt,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DuplicateResource(id) => {
                write!(f, "duplicate resource id '{}' in group", id)
            }
            BuildError::HeterogeneousGroup(id) => {
                write!(f, "tile group '{}' mixes unit tiles and auto-tiles", id)
            }
            BuildError::MissingResource(id) => {
                write!(f, "resource '{}' not present in loaded resources", id)
            }
            BuildError::EmptyDistribution => {
                write!(f, "weighted choice over an empty distribution")
            }
            BuildError::ShapeMismatch { expected, found } => write!(
                f,
                "cache shape mismatch: expected {}x{}x{}, found {}x{}x{}",
                expected.0, expected.1, expected.2, found.0, found.1, found.2
            ),
            BuildError::AssetLoadFailed { path } => {
                write!(f, "asset load failed: '{}' does not resolve", path)
            }
            BuildError::DuplicateElement(name) => {
                write!(f, "element '{}' already registered", name)
            }
            BuildError::BuildAborted { element, cause } => {
                write!(f, "element '{}' aborted the build: {}", element, cause)
            }
            BuildError::InvariantViolated(msg) => {
                write!(f, "cache invariant violated: {}", msg)
            }
            BuildError::MapNotBuilt => {
                write!(f, "map not built yet, call build() first")
            }
        }
    }
}

impl std::error::Error for BuildError {}
