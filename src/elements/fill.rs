//! Area fill: carpet a region (or the whole map) with a weighted tile group.

use crate::cache::MapCache;
use crate::descriptor::{ResourceSet, TileGroup};
use crate::element::MapElement;
use crate::error::BuildError;
use crate::loader::LoadedResources;

/// Fills a rectangle with tiles drawn from one group.
///
/// Without an explicit region the whole map is filled. The group comes from
/// the constructor or from a builder-level override of the `tiles` tag.
pub struct FillElement {
    name: String,
    layer: u32,
    region: Option<(i32, i32, u32, u32)>,
    tiles: Option<TileGroup>,
}

impl FillElement {
    pub const TILES: &'static str = "tiles";

    pub fn new(name: &str, layer: u32) -> Self {
        Self {
            name: name.to_string(),
            layer,
            region: None,
            tiles: None,
        }
    }

    /// Restrict the fill to `(x, y, width, height)`.
    pub fn region(mut self, x: i32, y: i32, width: u32, height: u32) -> Self {
        self.region = Some((x, y, width, height));
        self
    }

    pub fn with_tiles(mut self, group: TileGroup) -> Self {
        self.tiles = Some(group);
        self
    }

    pub fn default_descriptors() -> ResourceSet {
        ResourceSet::new().add_tile_group(TileGroup::new(Self::TILES))
    }
}

impl MapElement for FillElement {
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
        let (x0, y0, w, h) = self
            .region
            .unwrap_or((0, 0, dims.width, dims.height));

        let mut positions = Vec::with_capacity((w * h) as usize);
        for y in y0..y0 + h as i32 {
            for x in x0..x0 + w as i32 {
                positions.push((x, y));
            }
        }

        let group = resources.tile_group(Self::TILES)?;
        cache.drop_tiles_from_tilegroup(group, &positions, self.layer)
    }
}
