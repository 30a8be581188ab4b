//! Collision layer derivation.
//!
//! Scans every non-reserved layer after all user elements have run and
//! stamps an obstacle tile on the collision layer for each colliding
//! occupant: unit tiles mark their own cell, objects mark every footprint
//! cell.

use crate::cache::{Footprint, MapCache};
use crate::descriptor::{ResourceSet, TileGroup, TileSpec};
use crate::element::MapElement;
use crate::error::BuildError;
use crate::loader::LoadedResources;

pub struct CollisionElement;

impl CollisionElement {
    pub const TILES: &'static str = "collision_tiles";
    pub const TILE: &'static str = "collision_tile";

    /// The obstacle tile group installed by default: a single placeholder
    /// sprite flagged as colliding.
    pub fn default_descriptors() -> ResourceSet {
        ResourceSet::new().add_tile_group(
            TileGroup::new(Self::TILES).add_tile(TileSpec::new(Self::TILE).collision(true)),
        )
    }
}

impl MapElement for CollisionElement {
    fn name(&self) -> &str {
        "collision"
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
        let target = match dims.collision_layer() {
            Some(layer) => layer,
            None => return Ok(()),
        };

        let group = resources.tile_group(Self::TILES)?;
        let obstacle = group
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
                if !tile.collision {
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

        // Several layers can flag the same cell; the first stamp wins.
        for (x, y) in stamps {
            cache.drop_tile(x, y, target, &obstacle);
        }
        Ok(())
    }
}
