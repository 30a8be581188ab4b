//! Noise-driven tile scatter: bushes, flowers, rivers, terrain strata.
//!
//! A noise field over the map selects the placement region. Thresholds give
//! organic patches (vegetation density), bands trace level sets (rivers and
//! lakeshores). The field seed derives from the cache seed and the element
//! name, so two scatter elements on one map stay independent while the whole
//! map replays from its master seed.

use crate::cache::MapCache;
use crate::descriptor::{ResourceSet, TileGroup};
use crate::element::MapElement;
use crate::error::BuildError;
use crate::loader::LoadedResources;
use crate::noise_field::NoiseField;
use crate::seeds::derive_seed;

/// Which noise field drives the scatter.
#[derive(Clone, Copy, Debug)]
pub enum ScatterNoise {
    Perlin { scale: f64, octaves: u32 },
    /// Coarse/fine blend; the classic shape for winding water.
    Double { coarse: f64, fine: f64 },
}

/// How the field selects cells.
#[derive(Clone, Copy, Debug)]
pub enum ScatterMask {
    /// Cells at or above a threshold.
    Above(f32),
    /// Cells inside a closed value band.
    Band(f32, f32),
}

pub struct ScatterElement {
    name: String,
    layer: u32,
    noise: ScatterNoise,
    mask: ScatterMask,
    tiles: Option<TileGroup>,
}

impl ScatterElement {
    pub const TILES: &'static str = "tiles";

    pub fn new(name: &str, layer: u32, noise: ScatterNoise, mask: ScatterMask) -> Self {
        Self {
            name: name.to_string(),
            layer,
            noise,
            mask,
            tiles: None,
        }
    }

    pub fn with_tiles(mut self, group: TileGroup) -> Self {
        self.tiles = Some(group);
        self
    }

    pub fn default_descriptors() -> ResourceSet {
        ResourceSet::new().add_tile_group(TileGroup::new(Self::TILES))
    }
}

impl MapElement for ScatterElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup_resources(&self) -> Result<ResourceSet, BuildError> {
        let group = match &self.tiles {
            Some(group) => {
                let mut group = group.clone();
                group.id = Self::TILES.to_string();
                group
            }
            None => TileGroup::new(Self::TILES),
        };
        Ok(ResourceSet::new().add_tile_group(group))
    }

    fn build(
        &mut self,
        cache: &mut MapCache,
        resources: &LoadedResources,
    ) -> Result<(), BuildError> {
        let dims = cache.dims();
        let seed = derive_seed(cache.seed(), &self.name);

        let field = match self.noise {
            ScatterNoise::Perlin { scale, octaves } => {
                NoiseField::perlin(dims.width, dims.height, seed, scale, octaves)
            }
            ScatterNoise::Double { coarse, fine } => {
                NoiseField::double_perlin(dims.width, dims.height, seed, coarse, fine)
            }
        };

        let positions = match self.mask {
            ScatterMask::Above(threshold) => field.cells_above(threshold),
            ScatterMask::Band(lo, hi) => field.cells_in_band(lo, hi),
        };

        let group = resources.tile_group(Self::TILES)?;
        cache.drop_tiles_from_tilegroup(group, &positions, self.layer)
    }
}
