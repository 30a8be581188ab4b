//! Cover layer derivation, the twin of the collision pass.
//!
//! Cells whose occupant provides cover (tree canopies, awnings) get a
//! marker tile on the cover layer so gameplay code can query concealment
//! without touching render layers.

use crate::cache::{Footprint, MapCache};
use crate::descriptor::{ResourceSet, TileGroup, TileSpec};
use crate::element::MapElement;
use crate::error::BuildError;
use crate::loader::LoadedResources;

pub struct CoverElement;

impl CoverElement {
    pub const TILES: &'static str = "cover_tiles";
    pub const TILE: &'static str = "cover_tile";

    pub fn default_descriptors() -> ResourceSet {
        ResourceSet::new().add_tile_group(
            TileGroup::new(Self::TILES).add_tile(TileSpec::new(Self::TILE).cover(true)),
        )
    }
}

impl MapElement for CoverElement {
    fn name(&self) -> &str {
        "cover"
    }

    fn setup_resources(&self) -> Result<ResourceSet, BuildError> {
        Ok(Self::default_descriptors())
    }

    fn build(
        &mut self,
        cache: &mut MapCache,
        resources: &LoadedResources,
    ) -> Result<(), BuildError> {
        let dims = cache.dims();
        let target = match dims.cover_layer() {
            Some(layer) => layer,
            None => return Ok(()),
        };

        let group = resources.tile_group(Self::TILES)?;
        let marker = group
            .members
            .first()
            .ok_or_else(|| BuildError::MissingResource(Self::TILE.to_string()))?
            .clone();

        let mut stamps = Vec::new();
        for layer in 0..dims.layers {
            if dims.is_reserved_layer(layer) {
                continue;
            }
            for (x, y, tile) in cache.get_layer(layer) {
                if !tile.cover {
                    continue;
                }
                match tile.footprint {
                    Footprint::Unit => stamps.push((x, y)),
                    Footprint::Object { w, h } => {
                        for dy in 0..h as i32 {
                            for dx in 0..w as i32 {
                                stamps.push((x + dx, y + dy));
                            }
                        }
                    }
                }
            }
        }

        for (x, y) in stamps {
            cache.drop_tile(x, y, target, &marker);
        }
        Ok(())
    }
}
