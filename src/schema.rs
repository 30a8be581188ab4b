//! The emitted map document, field-for-field compatible with the common
//! tile-map editor JSON format.
//!
//! Serialization is plain serde; the structs also deserialize so tests and
//! downstream tools can parse an emitted map back.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub orientation: String,
    pub renderorder: String,
    pub version: String,
    pub nextlayerid: u32,
    pub nextobjectid: u32,
    pub layers: Vec<MapLayer>,
    pub tilesets: Vec<TilesetRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapLayer {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub opacity: f32,
    pub x: i32,
    pub y: i32,
    /// Row-major gids, `width * height` entries, 0 = empty.
    pub data: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TilesetRecord {
    pub firstgid: u32,
    pub name: String,
    pub columns: u32,
    pub image: String,
    pub imagewidth: u32,
    pub imageheight: u32,
    pub margin: u32,
    pub spacing: u32,
    pub tilecount: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiles: Vec<TileRecord>,
}

/// Per-tile metadata: collision/cover boolean properties.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: u32,
    pub properties: Vec<PropertyRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: bool,
}

impl PropertyRecord {
    pub fn boolean(name: &str, value: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: "bool".to_string(),
            value,
        }
    }
}
