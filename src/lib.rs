//! Procedural tile-map generation library
//!
//! Composes rectangular multi-layer tile maps from independent generators
//! ("elements") and emits them in the common tile-map editor JSON format.
//! Featuring:
//! - Layered grid cache with object footprints and trial/commit placement
//! - Seeded, fully deterministic builds (weighted choice + Perlin fields)
//! - Blob47 auto-tiling resolved lazily over the finished grid
//! - Derived collision and cover layers
//! - Reusable fill / scatter / rect elements to compose concrete maps

pub mod autotile;
pub mod builder;
pub mod cache;
pub mod descriptor;
pub mod element;
pub mod elements;
pub mod error;
pub mod export;
pub mod grid;
pub mod loader;
pub mod noise_field;
pub mod random;
pub mod schema;
pub mod seeds;

pub use builder::MapBuilder;
pub use cache::{Cell, Footprint, MapCache, MapDims, TileRef};
pub use descriptor::{
    AutoTileSpec, GroupSpec, ObjectGroup, ObjectSpec, ResourceSet, TileGroup, TileSpec,
};
pub use element::MapElement;
pub use error::BuildError;
pub use loader::{LoadedResources, ResourceLoader};
pub use noise_field::NoiseField;
