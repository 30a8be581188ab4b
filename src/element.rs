//! The element lifecycle contract.
//!
//! An element is a named generator contributing tiles and objects to the
//! shared cache. Its life has two phases, driven by the builder:
//!
//! 1. `setup_resources` declares the descriptor groups the element needs,
//!    keyed by its stable resource tags. It must be pure with respect to the
//!    cache and runs once per build; when the caller registered an override
//!    set on the builder, the overrides are merged over these defaults and
//!    setup output is used only to fill the gaps.
//! 2. `build` places tiles and objects through the cache API, reading its
//!    loaded groups by tag. Elements never see each other directly; all
//!    cross-element effects flow through the cache, in insertion order.
//!
//! `build` runs at most once per element per build. On failure it must
//! either leave the cache invariant-clean (roll back through a cache copy)
//! or return an error, which the builder reports as `BuildAborted`.

use crate::cache::MapCache;
use crate::descriptor::ResourceSet;
use crate::error::BuildError;
use crate::loader::LoadedResources;

pub trait MapElement {
    /// Unique name within a builder; duplicate names are rejected.
    fn name(&self) -> &str;

    /// The descriptor groups this element installs by default.
    fn setup_resources(&self) -> Result<ResourceSet, BuildError>;

    /// Place this element into the cache.
    fn build(
        &mut self,
        cache: &mut MapCache,
        resources: &LoadedResources,
    ) -> Result<(), BuildError>;
}
