//! Map document generation, JSON export, and raster preview.
//!
//! The document generator turns a finalized cache plus its tileset table
//! into the editor-compatible schema. The preview renders each cell as a
//! solid color keyed deterministically by gid; real sprite compositing is a
//! downstream concern, the emitted JSON is the contract.

use std::collections::hash_map::DefaultHasher;
use std::error::Error;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};

use crate::cache::MapCache;
use crate::loader::{TilesetEntry, TILE_SIZE};
use crate::schema::{MapDocument, MapLayer, PropertyRecord, TileRecord, TilesetRecord};

/// Pixels per cell in preview renders.
const PREVIEW_CELL_PX: u32 = 4;

/// Build the map document from a finalized cache.
///
/// Every layer with content is emitted, and the reserved collision/cover
/// layers are always emitted so consumers can rely on their presence.
/// Footprint reservations are not occupants and emit gid 0.
pub fn generate_document(cache: &MapCache, tilesets: &[TilesetEntry]) -> MapDocument {
    let dims = cache.dims();

    let mut layers = Vec::new();
    for layer in 0..dims.layers {
        let mut data = vec![0u32; (dims.width * dims.height) as usize];
        for (x, y, tile) in cache.get_layer(layer) {
            let firstgid = tilesets[tile.tileset as usize].firstgid;
            data[(y as u32 * dims.width + x as u32) as usize] = firstgid + tile.local;
        }

        let reserved = dims.is_reserved_layer(layer);
        if !reserved && data.iter().all(|&gid| gid == 0) {
            continue;
        }

        let name = if Some(layer) == dims.collision_layer() {
            "Obstacles".to_string()
        } else if Some(layer) == dims.cover_layer() {
            "CoverLayer".to_string()
        } else {
            format!("Layer_{}", layer + 1)
        };

        layers.push(MapLayer {
            id: layer,
            name,
            kind: "tilelayer".to_string(),
            width: dims.width,
            height: dims.height,
            visible: true,
            opacity: 1.0,
            x: 0,
            y: 0,
            data,
        });
    }

    MapDocument {
        width: dims.width,
        height: dims.height,
        tilewidth: TILE_SIZE,
        tileheight: TILE_SIZE,
        kind: "map".to_string(),
        orientation: "orthogonal".to_string(),
        renderorder: "right-down".to_string(),
        version: "1.10".to_string(),
        nextlayerid: dims.layers + 1,
        nextobjectid: 1,
        layers,
        tilesets: tilesets.iter().map(tileset_record).collect(),
    }
}

fn tileset_record(entry: &TilesetEntry) -> TilesetRecord {
    let rows = entry.tilecount.div_ceil(entry.columns);
    TilesetRecord {
        firstgid: entry.firstgid,
        name: entry.name.clone(),
        columns: entry.columns,
        image: entry.image.clone(),
        imagewidth: entry.columns * TILE_SIZE,
        imageheight: rows * TILE_SIZE,
        margin: 0,
        spacing: 0,
        tilecount: entry.tilecount,
        tilewidth: TILE_SIZE,
        tileheight: TILE_SIZE,
        tiles: entry
            .properties
            .iter()
            .map(|p| {
                let mut properties = Vec::new();
                if p.collision {
                    properties.push(PropertyRecord::boolean("collision", true));
                }
                if p.cover {
                    properties.push(PropertyRecord::boolean("cover", true));
                }
                TileRecord {
                    id: p.local,
                    properties,
                }
            })
            .collect(),
    }
}

/// Serialize the document to pretty-printed JSON at `path`.
pub fn write_map_json(document: &MapDocument, path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json)?;
    Ok(path.to_path_buf())
}

/// Render a solid-color preview of the composited layers.
///
/// Layers draw bottom-up, later layers overwriting earlier ones where they
/// have content, which mirrors the editor's render order.
pub fn render_preview(
    cache: &MapCache,
    tilesets: &[TilesetEntry],
    path: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let dims = cache.dims();
    let mut img: RgbImage = ImageBuffer::new(
        dims.width * PREVIEW_CELL_PX,
        dims.height * PREVIEW_CELL_PX,
    );

    for layer in 0..dims.layers {
        for (x, y, tile) in cache.get_layer(layer) {
            let gid = tilesets[tile.tileset as usize].firstgid + tile.local;
            let color = gid_color(gid);
            for py in 0..PREVIEW_CELL_PX {
                for px in 0..PREVIEW_CELL_PX {
                    img.put_pixel(
                        x as u32 * PREVIEW_CELL_PX + px,
                        y as u32 * PREVIEW_CELL_PX + py,
                        Rgb(color),
                    );
                }
            }
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    img.save(path)?;
    Ok(path.to_path_buf())
}

/// Deterministic color for a gid, bright enough to stand out on black.
fn gid_color(gid: u32) -> [u8; 3] {
    let mut hasher = DefaultHasher::new();
    gid.hash(&mut hasher);
    let bits = hasher.finish();
    [
        64 + (bits & 0xBF) as u8,
        64 + ((bits >> 8) & 0xBF) as u8,
        64 + ((bits >> 16) & 0xBF) as u8,
    ]
}
