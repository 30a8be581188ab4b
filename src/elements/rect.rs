//! Rectangular object placement: drop weighted objects across a region.

use crate::cache::MapCache;
use crate::descriptor::{ObjectGroup, ResourceSet};
use crate::element::MapElement;
use crate::error::BuildError;
use crate::loader::LoadedResources;

/// Places objects from one group at every cell of a rectangle.
///
/// Object footprints reject overlapping placements on their own, so a dense
/// position list degrades gracefully into a packing: each cell tries one
/// weighted draw and keeps whatever fits.
pub struct RectElement {
    name: String,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    layer: u32,
    objects: Option<ObjectGroup>,
}

impl RectElement {
    pub const OBJECTS: &'static str = "objects";

    pub fn new(name: &str, x: i32, y: i32, width: u32, height: u32, layer: u32) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            width,
            height,
            layer,
            objects: None,
        }
    }

    pub fn with_objects(mut self, group: ObjectGroup) -> Self {
        self.objects = Some(group);
        self
    }

    pub fn default_descriptors() -> ResourceSet {
        ResourceSet::new().add_object_group(ObjectGroup::new(Self::OBJECTS))
    }

    fn within_bounds(&self, map_width: u32, map_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as u32 + self.width <= map_width
            && self.y as u32 + self.height <= map_height
    }
}

impl MapElement for RectElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup_resources(&self) -> Result<ResourceSet, BuildError> {
        let group = match &self.objects {
            Some(group) => {
                let mut group = group.clone();
                group.id = Self::OBJECTS.to_string();
                group
            }
            None => ObjectGroup::new(Self::OBJECTS),
        };
        Ok(ResourceSet::new().add_object_group(group))
    }

    fn build(
        &mut self,
        cache: &mut MapCache,
        resources: &LoadedResources,
    ) -> Result<(), BuildError> {
        let dims = cache.dims();
        if !self.within_bounds(dims.width, dims.height) {
            return Err(BuildError::BuildAborted {
                element: self.name.clone(),
                cause: format!(
                    "region ({}, {}, {}, {}) exceeds map bounds {}x{}",
                    self.x, self.y, self.width, self.height, dims.width, dims.height
                ),
            });
        }

        let mut positions = Vec::with_capacity((self.width * self.height) as usize);
        for y in self.y..self.y + self.height as i32 {
            for x in self.x..self.x + self.width as i32 {
                positions.push((x, y));
            }
        }

        let group = resources.object_group(Self::OBJECTS)?;
        cache.drop_objects_from_objectgroup(group, &positions, self.layer)
    }
}
