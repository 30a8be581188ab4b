//! Resource loading: image path resolution and tileset index allocation.
//!
//! The loader walks every descriptor group before any element builds,
//! verifies that referenced images exist (decoding is the exporter's
//! concern), and assigns stable render indices:
//!
//! - unit tiles, object sprites and the shared placeholder live in one
//!   dynamic tileset, deduplicated by image path;
//! - every auto-tile gets its own 47-sprite tileset plus a family id for
//!   neighborhood resolution.
//!
//! Allocation follows descriptor order, so a fixed element sequence always
//! produces the same tileset table and the same gids.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::autotile::Blob47Table;
use crate::descriptor::{GroupSpec, ResourceSet};
use crate::error::BuildError;

/// Tile edge length in pixels for every emitted tileset.
pub const TILE_SIZE: u32 = 32;

/// Local index of the shared placeholder sprite in the dynamic tileset.
pub const PLACEHOLDER_LOCAL: u32 = 0;

const DYNAMIC_COLUMNS: u32 = 16;
const AUTOTILE_COLUMNS: u32 = 8;

/// How a loaded tile renders: a fixed sprite or a blob47 family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadedTileKind {
    Unit,
    AutoTile { family: u32 },
}

/// A tile descriptor resolved to its render indices.
#[derive(Clone, Debug)]
pub struct LoadedTile {
    pub resource_id: String,
    pub rate: u32,
    pub collision: bool,
    pub cover: bool,
    /// Index into the builder's tileset table.
    pub tileset: u32,
    /// Local sprite index within that tileset. For auto-tiles this is the
    /// interior sprite until the resolver materializes the real variant.
    pub local: u32,
    pub kind: LoadedTileKind,
}

#[derive(Clone, Debug)]
pub struct LoadedTileGroup {
    pub id: String,
    pub members: Vec<LoadedTile>,
}

/// An object descriptor resolved to its anchor sprite.
#[derive(Clone, Debug)]
pub struct LoadedObject {
    pub resource_id: String,
    pub width: u32,
    pub height: u32,
    pub rate: u32,
    pub collision: bool,
    pub cover: bool,
    pub functions: Vec<(String, String)>,
    pub tileset: u32,
    pub local: u32,
}

#[derive(Clone, Debug)]
pub struct LoadedObjectGroup {
    pub id: String,
    pub members: Vec<LoadedObject>,
}

#[derive(Clone, Debug)]
pub enum LoadedResource {
    Tiles(LoadedTileGroup),
    Objects(LoadedObjectGroup),
}

/// An element's loaded resources, keyed by the group ids it declared.
#[derive(Clone, Debug, Default)]
pub struct LoadedResources {
    map: HashMap<String, LoadedResource>,
}

impl LoadedResources {
    pub fn get(&self, id: &str) -> Option<&LoadedResource> {
        self.map.get(id)
    }

    pub fn tile_group(&self, id: &str) -> Result<&LoadedTileGroup, BuildError> {
        match self.map.get(id) {
            Some(LoadedResource::Tiles(group)) => Ok(group),
            _ => Err(BuildError::MissingResource(id.to_string())),
        }
    }

    pub fn object_group(&self, id: &str) -> Result<&LoadedObjectGroup, BuildError> {
        match self.map.get(id) {
            Some(LoadedResource::Objects(group)) => Ok(group),
            _ => Err(BuildError::MissingResource(id.to_string())),
        }
    }
}

/// A tileset in the emitted map, with its gid range metadata.
#[derive(Clone, Debug)]
pub struct TilesetEntry {
    pub name: String,
    pub image: String,
    pub firstgid: u32,
    pub tilecount: u32,
    pub columns: u32,
    /// Locals carrying collision/cover boolean tile properties.
    pub properties: Vec<TileProperty>,
}

#[derive(Clone, Debug)]
pub struct TileProperty {
    pub local: u32,
    pub collision: bool,
    pub cover: bool,
}

struct AutoTileEntry {
    name: String,
    image: String,
}

/// Allocates tileset indices across every element of a build.
pub struct ResourceLoader {
    dynamic_locals: HashMap<String, u32>,
    dynamic_count: u32,
    dynamic_flags: HashMap<u32, (bool, bool)>,
    autotiles: Vec<AutoTileEntry>,
}

impl ResourceLoader {
    pub fn new() -> Self {
        let mut dynamic_locals = HashMap::new();
        dynamic_locals.insert(placeholder_key().to_string(), PLACEHOLDER_LOCAL);
        Self {
            dynamic_locals,
            dynamic_count: 1,
            dynamic_flags: HashMap::new(),
            autotiles: Vec::new(),
        }
    }

    /// Load one element's resource set.
    ///
    /// Validates the set, checks every referenced image path in parallel,
    /// then allocates indices in declaration order.
    pub fn load_set(&mut self, set: &ResourceSet) -> Result<LoadedResources, BuildError> {
        set.validate()?;
        self.check_paths(set)?;

        let mut loaded = LoadedResources::default();
        for group in set.iter() {
            let resource = match group {
                GroupSpec::Tiles(tiles) => LoadedResource::Tiles(self.load_tile_group(tiles)),
                GroupSpec::Objects(objects) => {
                    LoadedResource::Objects(self.load_object_group(objects))
                }
            };
            loaded.map.insert(group.id().to_string(), resource);
        }
        Ok(loaded)
    }

    fn check_paths(&self, set: &ResourceSet) -> Result<(), BuildError> {
        let mut paths: Vec<&str> = Vec::new();
        for group in set.iter() {
            match group {
                GroupSpec::Tiles(tiles) => {
                    paths.extend(tiles.tiles().iter().filter_map(|t| t.image.as_deref()));
                    paths.extend(tiles.auto_tiles().iter().filter_map(|a| a.image.as_deref()));
                }
                GroupSpec::Objects(objects) => {
                    paths.extend(objects.objects().iter().filter_map(|o| o.image.as_deref()));
                }
            }
        }

        // Existence checks are independent; the first failure in
        // declaration order is reported so errors stay deterministic.
        let missing: Vec<&str> = paths
            .par_iter()
            .copied()
            .filter(|p| !Path::new(p).exists())
            .collect();
        match missing.first() {
            Some(path) => Err(BuildError::AssetLoadFailed {
                path: path.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn load_tile_group(&mut self, group: &crate::descriptor::TileGroup) -> LoadedTileGroup {
        let mut members = Vec::new();

        for tile in group.tiles() {
            let local = self.dynamic_local(tile.image.as_deref(), tile.collision, tile.cover);
            members.push(LoadedTile {
                resource_id: tile.resource_id.clone(),
                rate: tile.rate,
                collision: tile.collision,
                cover: tile.cover,
                tileset: 0,
                local,
                kind: LoadedTileKind::Unit,
            });
        }

        for auto_tile in group.auto_tiles() {
            let family = self.autotiles.len() as u32;
            let image = auto_tile
                .image
                .clone()
                .unwrap_or_else(|| format!("tilesets/autotile_{}.png", family));
            self.autotiles.push(AutoTileEntry {
                name: format!("autotile_{}", auto_tile.resource_id),
                image,
            });
            members.push(LoadedTile {
                resource_id: auto_tile.resource_id.clone(),
                rate: auto_tile.rate,
                collision: auto_tile.collision,
                cover: auto_tile.cover,
                tileset: 1 + family,
                local: u32::from(Blob47Table::INTERIOR_INDEX),
                kind: LoadedTileKind::AutoTile { family },
            });
        }

        LoadedTileGroup {
            id: group.id.clone(),
            members,
        }
    }

    fn load_object_group(&mut self, group: &crate::descriptor::ObjectGroup) -> LoadedObjectGroup {
        let members = group
            .objects()
            .iter()
            .map(|object| {
                let local =
                    self.dynamic_local(object.image.as_deref(), object.collision, object.cover);
                LoadedObject {
                    resource_id: object.resource_id.clone(),
                    width: object.width,
                    height: object.height,
                    rate: object.rate,
                    collision: object.collision,
                    cover: object.cover,
                    functions: object.functions.clone(),
                    tileset: 0,
                    local,
                }
            })
            .collect();

        LoadedObjectGroup {
            id: group.id.clone(),
            members,
        }
    }

    fn dynamic_local(&mut self, image: Option<&str>, collision: bool, cover: bool) -> u32 {
        let key = image.unwrap_or_else(|| placeholder_key());
        let local = match self.dynamic_locals.get(key) {
            Some(&local) => local,
            None => {
                let local = self.dynamic_count;
                self.dynamic_locals.insert(key.to_string(), local);
                self.dynamic_count += 1;
                local
            }
        };
        let flags = self.dynamic_flags.entry(local).or_insert((false, false));
        flags.0 |= collision;
        flags.1 |= cover;
        local
    }

    /// Finish loading and produce the tileset table with chained firstgids.
    pub fn into_tilesets(self) -> Vec<TilesetEntry> {
        let mut properties: Vec<TileProperty> = self
            .dynamic_flags
            .iter()
            .filter(|(_, &(collision, cover))| collision || cover)
            .map(|(&local, &(collision, cover))| TileProperty {
                local,
                collision,
                cover,
            })
            .collect();
        properties.sort_by_key(|p| p.local);

        let mut tilesets = vec![TilesetEntry {
            name: "dynamic_tileset".to_string(),
            image: "tilesets/dynamic_tileset.png".to_string(),
            firstgid: 1,
            tilecount: self.dynamic_count,
            columns: DYNAMIC_COLUMNS,
            properties,
        }];

        let mut next_gid = 1 + self.dynamic_count;
        for autotile in self.autotiles {
            tilesets.push(TilesetEntry {
                name: autotile.name,
                image: autotile.image,
                firstgid: next_gid,
                tilecount: Blob47Table::TILE_COUNT,
                columns: AUTOTILE_COLUMNS,
                properties: Vec::new(),
            });
            next_gid += Blob47Table::TILE_COUNT;
        }

        tilesets
    }
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder_key() -> &'static str {
    "<placeholder>"
}
