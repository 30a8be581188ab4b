//! The layered map cache: placement primitives and trial/commit semantics.
//!
//! A cache is a stack of `layers` grids plus one deterministic RNG stream.
//! Placement operations are guarded: they either apply completely or leave
//! the cache untouched and report `false`. Speculative multi-step mutations
//! go through `create_copy` / `assign`, which copies the whole grid and the
//! RNG state so a committed trial is indistinguishable from having mutated
//! the original directly.

use std::collections::HashMap;

use rand_chacha::ChaCha8Rng;

use crate::autotile::{adjacency_mask, Blob47Table};
use crate::error::BuildError;
use crate::grid::Grid;
use crate::loader::{LoadedObject, LoadedObjectGroup, LoadedTile, LoadedTileGroup, LoadedTileKind};
use crate::random::{seeded_rng, weighted_choice};
use crate::seeds::derive_seed_offset;

/// Map dimensions: width, height, and layer count.
///
/// With three or more layers the two highest are reserved: the collision
/// layer below the cover layer. Smaller stacks have no reserved layers and
/// skip the derivation passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapDims {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

impl MapDims {
    pub fn new(width: u32, height: u32, layers: u32) -> Self {
        Self {
            width,
            height,
            layers,
        }
    }

    pub fn collision_layer(&self) -> Option<u32> {
        if self.layers >= 3 {
            Some(self.layers - 2)
        } else {
            None
        }
    }

    pub fn cover_layer(&self) -> Option<u32> {
        if self.layers >= 3 {
            Some(self.layers - 1)
        } else {
            None
        }
    }

    /// Whether a layer is one of the derived collision/cover layers.
    pub fn is_reserved_layer(&self, layer: u32) -> bool {
        Some(layer) == self.collision_layer() || Some(layer) == self.cover_layer()
    }

    fn as_tuple(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.layers)
    }
}

/// The cells an occupant covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Footprint {
    Unit,
    Object { w: u32, h: u32 },
}

/// One placed occupant, stored at its anchor (or only) cell.
#[derive(Clone, Debug)]
pub struct TileRef {
    pub resource_id: String,
    pub group_id: String,
    pub footprint: Footprint,
    pub collision: bool,
    pub cover: bool,
    /// Family id when this cell participates in blob47 resolution.
    pub auto_tile_family: Option<u32>,
    /// Render indices into the builder's tileset table. For auto-tile cells
    /// `local` holds the interior sprite until the resolver runs.
    pub tileset: u32,
    pub local: u32,
}

/// Cell state on one layer: an occupant, or a reservation pointing back at
/// the object anchor covering this cell.
#[derive(Clone, Debug)]
pub enum Cell {
    Tile(TileRef),
    Reserved { anchor: (i32, i32) },
}

/// The in-memory multi-layer grid built during a single build cycle.
pub struct MapCache {
    dims: MapDims,
    seed: u64,
    rng: ChaCha8Rng,
    layers: Vec<Grid<Option<Cell>>>,
    /// Per layer: every footprint cell (anchor included) -> its anchor.
    anchors: Vec<HashMap<(i32, i32), (i32, i32)>>,
}

impl MapCache {
    pub fn new(dims: MapDims, seed: u64) -> Self {
        Self {
            dims,
            seed,
            rng: seeded_rng(seed),
            layers: (0..dims.layers)
                .map(|_| Grid::new_with(dims.width, dims.height, None))
                .collect(),
            anchors: (0..dims.layers).map(|_| HashMap::new()).collect(),
        }
    }

    pub fn dims(&self) -> MapDims {
        self.dims
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The cache-owned RNG stream. All randomness in a build flows through
    /// here so that equal seeds replay identically.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    fn valid_cell(&self, x: i32, y: i32, layer: u32) -> bool {
        layer < self.dims.layers && self.layers[layer as usize].in_bounds(x, y)
    }

    /// The raw cell state, `None` when empty or out of bounds.
    pub fn cell(&self, x: i32, y: i32, layer: u32) -> Option<&Cell> {
        if !self.valid_cell(x, y, layer) {
            return None;
        }
        self.layers[layer as usize].get(x as u32, y as u32).as_ref()
    }

    /// The occupant rendered at a cell: a unit tile or an object anchor.
    /// Footprint reservations yield `None`.
    pub fn get_tile(&self, x: i32, y: i32, layer: u32) -> Option<&TileRef> {
        match self.cell(x, y, layer) {
            Some(Cell::Tile(tile)) => Some(tile),
            _ => None,
        }
    }

    /// Whether anything occupies a cell: unit, anchor, or reservation.
    pub fn check_exists(&self, x: i32, y: i32, layer: u32) -> bool {
        self.cell(x, y, layer).is_some()
    }

    /// Collision property of the occupant covering a cell, reservations
    /// resolving through their anchor.
    pub fn check_collision(&self, x: i32, y: i32, layer: u32) -> bool {
        self.resolved_tile(x, y, layer).map_or(false, |t| t.collision)
    }

    /// Cover property of the occupant covering a cell.
    pub fn check_cover(&self, x: i32, y: i32, layer: u32) -> bool {
        self.resolved_tile(x, y, layer).map_or(false, |t| t.cover)
    }

    fn resolved_tile(&self, x: i32, y: i32, layer: u32) -> Option<&TileRef> {
        match self.cell(x, y, layer)? {
            Cell::Tile(tile) => Some(tile),
            Cell::Reserved { anchor } => self.get_tile(anchor.0, anchor.1, layer),
        }
    }

    /// Place a unit tile. Succeeds iff the cell is in bounds and empty;
    /// on failure the cache is unchanged. Never panics on bad coordinates.
    pub fn drop_tile(&mut self, x: i32, y: i32, layer: u32, tile: &LoadedTile) -> bool {
        self.drop_tile_tagged(x, y, layer, tile, "")
    }

    fn drop_tile_tagged(
        &mut self,
        x: i32,
        y: i32,
        layer: u32,
        tile: &LoadedTile,
        group_id: &str,
    ) -> bool {
        if !self.valid_cell(x, y, layer) || self.check_exists(x, y, layer) {
            return false;
        }

        let family = match tile.kind {
            LoadedTileKind::Unit => None,
            LoadedTileKind::AutoTile { family } => Some(family),
        };
        self.layers[layer as usize].set(
            x as u32,
            y as u32,
            Some(Cell::Tile(TileRef {
                resource_id: tile.resource_id.clone(),
                group_id: group_id.to_string(),
                footprint: Footprint::Unit,
                collision: tile.collision,
                cover: tile.cover,
                auto_tile_family: family,
                tileset: tile.tileset,
                local: tile.local,
            })),
        );
        true
    }

    /// Scatter a tile group over a set of positions.
    ///
    /// Each position draws one member by weighted choice; occupied cells are
    /// silently skipped. Auto-tile members tag the cell with their family
    /// rather than a concrete variant; the resolver picks variants once the
    /// cache has quiesced.
    pub fn drop_tiles_from_tilegroup(
        &mut self,
        group: &LoadedTileGroup,
        positions: &[(i32, i32)],
        layer: u32,
    ) -> Result<(), BuildError> {
        for &(x, y) in positions {
            let member = weighted_choice(&mut self.rng, &group.members, |m| m.rate)?;
            self.drop_tile_tagged(x, y, layer, member, &group.id);
        }
        Ok(())
    }

    /// Place an object with its anchor at `(x, y)`.
    ///
    /// Succeeds iff every footprint cell is in bounds and empty on this
    /// layer, and, for colliding objects, empty on the collision layer too.
    /// On success the anchor carries the object and the remaining cells
    /// become reservations; on failure nothing changes.
    pub fn drop_object(&mut self, x: i32, y: i32, layer: u32, object: &LoadedObject) -> bool {
        self.drop_object_tagged(x, y, layer, object, "")
    }

    fn drop_object_tagged(
        &mut self,
        x: i32,
        y: i32,
        layer: u32,
        object: &LoadedObject,
        group_id: &str,
    ) -> bool {
        if layer >= self.dims.layers {
            return false;
        }

        for dy in 0..object.height as i32 {
            for dx in 0..object.width as i32 {
                let (cx, cy) = (x + dx, y + dy);
                if !self.valid_cell(cx, cy, layer) || self.check_exists(cx, cy, layer) {
                    return false;
                }
                if object.collision {
                    if let Some(collision_layer) = self.dims.collision_layer() {
                        if self.check_exists(cx, cy, collision_layer) {
                            return false;
                        }
                    }
                }
            }
        }

        for dy in 0..object.height as i32 {
            for dx in 0..object.width as i32 {
                let (cx, cy) = (x + dx, y + dy);
                let cell = if (dx, dy) == (0, 0) {
                    Cell::Tile(TileRef {
                        resource_id: object.resource_id.clone(),
                        group_id: group_id.to_string(),
                        footprint: Footprint::Object {
                            w: object.width,
                            h: object.height,
                        },
                        collision: object.collision,
                        cover: object.cover,
                        auto_tile_family: None,
                        tileset: object.tileset,
                        local: object.local,
                    })
                } else {
                    Cell::Reserved { anchor: (x, y) }
                };
                self.layers[layer as usize].set(cx as u32, cy as u32, Some(cell));
                self.anchors[layer as usize].insert((cx, cy), (x, y));
            }
        }
        true
    }

    /// Scatter an object group over a set of positions.
    ///
    /// Each position draws one member by weighted choice; placements that
    /// fail their footprint checks are silently skipped.
    pub fn drop_objects_from_objectgroup(
        &mut self,
        group: &LoadedObjectGroup,
        positions: &[(i32, i32)],
        layer: u32,
    ) -> Result<(), BuildError> {
        for &(x, y) in positions {
            let member = weighted_choice(&mut self.rng, &group.members, |m| m.rate)?;
            self.drop_object_tagged(x, y, layer, member, &group.id);
        }
        Ok(())
    }

    /// Anchor of the object covering a cell, if any.
    pub fn object_anchor(&self, x: i32, y: i32, layer: u32) -> Option<(i32, i32)> {
        if layer >= self.dims.layers {
            return None;
        }
        self.anchors[layer as usize].get(&(x, y)).copied()
    }

    /// All occupants of a layer in row-major order: unit tiles and object
    /// anchors, never footprint reservations.
    pub fn get_layer(&self, layer: u32) -> impl Iterator<Item = (i32, i32, &TileRef)> {
        self.layers[layer as usize].iter().filter_map(|(x, y, cell)| {
            match cell {
                Some(Cell::Tile(tile)) => Some((x as i32, y as i32, tile)),
                _ => None,
            }
        })
    }

    /// Occupied neighbor coordinates within a Chebyshev radius.
    pub fn neighbors(&self, x: i32, y: i32, layer: u32, radius: i32) -> Vec<(i32, i32)> {
        let mut result = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if self.check_exists(nx, ny, layer) {
                    result.push((nx, ny));
                }
            }
        }
        result
    }

    /// Whether the empty region around a cell reaches the map border.
    ///
    /// 8-connected flood fill over empty cells. An occupied start counts as
    /// reaching the edge; layout generators use this to detect cells sealed
    /// inside an enclosure.
    pub fn flood_fill_reaches_edge(&self, start_x: i32, start_y: i32, layer: u32) -> bool {
        use std::collections::VecDeque;

        if !self.valid_cell(start_x, start_y, layer) {
            return false;
        }
        if self.check_exists(start_x, start_y, layer) {
            return true;
        }

        let mut queue = VecDeque::from([(start_x, start_y)]);
        let mut visited = std::collections::HashSet::from([(start_x, start_y)]);

        while let Some((x, y)) = queue.pop_front() {
            if x == 0 || y == 0 || x == self.dims.width as i32 - 1 || y == self.dims.height as i32 - 1
            {
                return true;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let next = (x + dx, y + dy);
                    if self.valid_cell(next.0, next.1, layer)
                        && !self.check_exists(next.0, next.1, layer)
                        && visited.insert(next)
                    {
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }

    /// Deep copy with a divergent RNG stream.
    ///
    /// The copy reseeds its RNG from `(seed, seed_offset)` so that repeated
    /// speculative attempts explore different draws deterministically.
    pub fn create_copy(&self, seed_offset: u64) -> MapCache {
        MapCache {
            dims: self.dims,
            seed: self.seed,
            rng: seeded_rng(derive_seed_offset(self.seed, seed_offset)),
            layers: self.layers.clone(),
            anchors: self.anchors.clone(),
        }
    }

    /// Commit another cache's state into this one.
    ///
    /// Grid, anchors, and RNG state are taken wholesale so the committed
    /// trial continues the copy's RNG stream. Dimensions must match.
    pub fn assign(&mut self, other: &MapCache) -> Result<(), BuildError> {
        if self.dims != other.dims {
            return Err(BuildError::ShapeMismatch {
                expected: self.dims.as_tuple(),
                found: other.dims.as_tuple(),
            });
        }
        self.seed = other.seed;
        self.rng = other.rng.clone();
        self.layers = other.layers.clone();
        self.anchors = other.anchors.clone();
        Ok(())
    }

    /// Materialize blob47 sprite indices into every auto-tile cell.
    ///
    /// Runs once over the quiesced cache, so cells placed in any order
    /// converge to the same rendering. A neighbor counts iff it carries the
    /// same family on the same layer; out-of-bounds neighbors count as
    /// occupied so regions continue past the map edge.
    pub fn resolve_auto_tiles(&mut self, table: &Blob47Table) {
        for layer in 0..self.dims.layers {
            let grid = &self.layers[layer as usize];

            let mut updates: Vec<(u32, u32, u32)> = Vec::new();
            for (x, y, cell) in grid.iter() {
                let family = match cell {
                    Some(Cell::Tile(tile)) => match tile.auto_tile_family {
                        Some(family) => family,
                        None => continue,
                    },
                    _ => continue,
                };
                let mask = adjacency_mask(
                    self.dims.width,
                    self.dims.height,
                    x as i32,
                    y as i32,
                    |nx, ny| {
                        matches!(
                            grid.get(nx as u32, ny as u32),
                            Some(Cell::Tile(t)) if t.auto_tile_family == Some(family)
                        )
                    },
                );
                updates.push((x, y, u32::from(table.index(mask))));
            }

            let grid = &mut self.layers[layer as usize];
            for (x, y, local) in updates {
                if let Some(Cell::Tile(tile)) = grid.get_mut(x, y) {
                    tile.local = local;
                }
            }
        }
    }
}
