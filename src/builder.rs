//! Build orchestration: elements in, editor-compatible map out.
//!
//! The builder owns the element list and drives the pipeline: descriptor
//! resolution, asset loading, sequential element builds, the collision and
//! cover derivation passes, blob47 resolution, then export. Any error
//! aborts the whole build and discards the cache; a partial map is never
//! exported.

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::autotile::Blob47Table;
use crate::cache::{MapCache, MapDims};
use crate::descriptor::ResourceSet;
use crate::element::MapElement;
use crate::elements::{CollisionElement, CoverElement};
use crate::error::BuildError;
use crate::export;
use crate::loader::{LoadedResources, ResourceLoader, TilesetEntry};
use crate::schema::MapDocument;
use crate::seeds::stable_seed;

struct ElementEntry {
    element: Box<dyn MapElement>,
    overrides: Option<ResourceSet>,
}

struct BuiltMap {
    cache: MapCache,
    tilesets: Vec<TilesetEntry>,
}

/// Builder for constructing a map from an ordered list of elements.
pub struct MapBuilder {
    map_id: String,
    dims: MapDims,
    seed: u64,
    elements: Vec<ElementEntry>,
    built: Option<BuiltMap>,
}

impl MapBuilder {
    /// Create a builder with 10 layers and a seed hashed from the map id.
    pub fn new(map_id: &str, width: u32, height: u32) -> Self {
        Self {
            map_id: map_id.to_string(),
            dims: MapDims::new(width, height, 10),
            seed: stable_seed(map_id),
            elements: Vec::new(),
            built: None,
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.dims = MapDims::new(self.dims.width, self.dims.height, layers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn dims(&self) -> MapDims {
        self.dims
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Append an element. Element names must be unique within a builder.
    pub fn add_element(
        &mut self,
        element: impl MapElement + 'static,
    ) -> Result<&mut Self, BuildError> {
        self.push_element(Box::new(element), None)
    }

    /// Append an element with a descriptor override set.
    ///
    /// The overrides are merged over the element's defaults at build time;
    /// group ids the overrides omit keep their default descriptors.
    pub fn add_element_with(
        &mut self,
        element: impl MapElement + 'static,
        overrides: ResourceSet,
    ) -> Result<&mut Self, BuildError> {
        self.push_element(Box::new(element), Some(overrides))
    }

    fn push_element(
        &mut self,
        element: Box<dyn MapElement>,
        overrides: Option<ResourceSet>,
    ) -> Result<&mut Self, BuildError> {
        if self.elements.iter().any(|e| e.element.name() == element.name()) {
            return Err(BuildError::DuplicateElement(element.name().to_string()));
        }
        self.elements.push(ElementEntry { element, overrides });
        Ok(self)
    }

    /// Run the full pipeline.
    ///
    /// Elements build strictly in insertion order against the shared cache;
    /// the derivation passes and blob47 resolution observe a quiesced cache.
    /// Elements are one-shot, so a builder builds at most once.
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.built.is_some() {
            return Err(BuildError::InvariantViolated(
                "build() already completed for this builder".to_string(),
            ));
        }

        eprintln!(
            "building map '{}' ({}x{}x{}) with {} elements, seed {}",
            self.map_id,
            self.dims.width,
            self.dims.height,
            self.dims.layers,
            self.elements.len(),
            self.seed
        );

        // Resolve descriptors and load all assets before any element builds.
        let mut loader = ResourceLoader::new();
        let mut loaded: Vec<LoadedResources> = Vec::new();
        for entry in &self.elements {
            let defaults = entry.element.setup_resources()?;
            let set = match &entry.overrides {
                Some(overrides) => overrides.clone().merge_defaults(defaults),
                None => defaults,
            };
            loaded.push(loader.load_set(&set)?);
        }

        let mut collision = CollisionElement;
        let mut cover = CoverElement;
        let derivation = if self.dims.collision_layer().is_some() {
            let collision_resources = loader.load_set(&collision.setup_resources()?)?;
            let cover_resources = loader.load_set(&cover.setup_resources()?)?;
            Some((collision_resources, cover_resources))
        } else {
            None
        };

        let tilesets = loader.into_tilesets();

        let mut cache = MapCache::new(self.dims, self.seed);
        for (entry, resources) in self.elements.iter_mut().zip(&loaded) {
            let name = entry.element.name().to_string();
            entry
                .element
                .build(&mut cache, resources)
                .map_err(|e| abort(&name, e))?;
        }

        if let Some((collision_resources, cover_resources)) = &derivation {
            collision
                .build(&mut cache, collision_resources)
                .map_err(|e| abort("collision", e))?;
            cover
                .build(&mut cache, cover_resources)
                .map_err(|e| abort("cover", e))?;
        }

        cache.resolve_auto_tiles(&Blob47Table::new());

        self.built = Some(BuiltMap { cache, tilesets });
        Ok(())
    }

    /// The finalized cache, available after a successful build.
    pub fn cache(&self) -> Option<&MapCache> {
        self.built.as_ref().map(|b| &b.cache)
    }

    pub fn tilesets(&self) -> Option<&[TilesetEntry]> {
        self.built.as_ref().map(|b| b.tilesets.as_slice())
    }

    /// Generate the editor-compatible map document.
    pub fn map_document(&self) -> Result<MapDocument, BuildError> {
        let built = self.built.as_ref().ok_or(BuildError::MapNotBuilt)?;
        Ok(export::generate_document(&built.cache, &built.tilesets))
    }

    /// Serialize the map document to JSON at `path`.
    pub fn export_map(&self, path: &Path) -> Result<PathBuf, Box<dyn Error>> {
        let document = self.map_document()?;
        export::write_map_json(&document, path)
    }

    /// Render a raster preview PNG at `path`.
    pub fn preview_map(&self, path: &Path) -> Result<PathBuf, Box<dyn Error>> {
        let built = self.built.as_ref().ok_or(BuildError::MapNotBuilt)?;
        export::render_preview(&built.cache, &built.tilesets, path)
    }
}

fn abort(element: &str, error: BuildError) -> BuildError {
    match error {
        aborted @ BuildError::BuildAborted { .. } => aborted,
        other => BuildError::BuildAborted {
            element: element.to_string(),
            cause: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Footprint;
    use crate::descriptor::{
        AutoTileSpec, ObjectGroup, ObjectSpec, ResourceSet, TileGroup, TileSpec,
    };
    use crate::elements::{FillElement, RectElement};

    fn grass_group() -> TileGroup {
        TileGroup::new("ground").add_tile(TileSpec::new("grass"))
    }

    #[test]
    fn test_duplicate_element_rejected() {
        let mut builder = MapBuilder::new("dup", 8, 8);
        builder.add_element(FillElement::new("meadow", 0)).unwrap();
        let err = builder
            .add_element(FillElement::new("meadow", 1))
            .err()
            .unwrap();
        assert_eq!(err, BuildError::DuplicateElement("meadow".to_string()));
    }

    #[test]
    fn test_grass_fill_scenario() {
        // W=4, H=2, single layer, one grass tile at rate 1: every cell
        // carries grass and the export data has 8 non-zero gids.
        let mut builder = MapBuilder::new("grass", 4, 2).with_layers(1).with_seed(1);
        builder
            .add_element(FillElement::new("meadow", 0).with_tiles(grass_group()))
            .unwrap();
        builder.build().unwrap();

        let cache = builder.cache().unwrap();
        assert_eq!(cache.get_layer(0).count(), 8);
        assert!(cache.get_layer(0).all(|(_, _, t)| t.resource_id == "grass"));

        let document = builder.map_document().unwrap();
        assert_eq!(document.layers.len(), 1);
        let data = &document.layers[0].data;
        assert_eq!(data.len(), 8);
        let grass_gid = data[0];
        assert!(grass_gid > 0);
        assert!(data.iter().all(|&gid| gid == grass_gid));
    }

    #[test]
    fn test_collision_derivation_scenario() {
        // A colliding 3x2 object at (10,10) on layer 3 puts obstacle tiles
        // on all six footprint cells of the collision layer.
        let mut builder = MapBuilder::new("town", 32, 32).with_seed(9);
        let overrides = ResourceSet::new().add_object_group(
            ObjectGroup::new(RectElement::OBJECTS)
                .add_object(ObjectSpec::new("house", 3, 2).collision(true)),
        );
        builder
            .add_element_with(RectElement::new("hall", 10, 10, 1, 1, 3), overrides)
            .unwrap();
        builder.build().unwrap();

        let cache = builder.cache().unwrap();
        let collision_layer = cache.dims().collision_layer().unwrap();
        for y in 10..12 {
            for x in 10..13 {
                assert!(cache.check_exists(x, y, collision_layer));
            }
        }
        assert_eq!(cache.get_layer(collision_layer).count(), 6);
        // Layer 3 still carries exactly the object anchor.
        assert_eq!(cache.get_layer(3).count(), 1);
        match cache.get_tile(10, 10, 3).unwrap().footprint {
            Footprint::Object { w, h } => assert_eq!((w, h), (3, 2)),
            _ => panic!("expected object anchor"),
        }
    }

    #[test]
    fn test_cover_derivation() {
        let mut builder = MapBuilder::new("canopy", 16, 16).with_seed(3);
        builder
            .add_element(
                FillElement::new("trees", 2)
                    .region(4, 4, 2, 2)
                    .with_tiles(TileGroup::new("trees").add_tile(TileSpec::new("tree").cover(true))),
            )
            .unwrap();
        builder.build().unwrap();

        let cache = builder.cache().unwrap();
        let cover_layer = cache.dims().cover_layer().unwrap();
        assert_eq!(cache.get_layer(cover_layer).count(), 4);
        assert!(cache.check_cover(4, 4, cover_layer));
    }

    #[test]
    fn test_build_determinism_scenario() {
        // Equal seeds yield byte-identical exports, including autotiles and
        // weighted draws.
        let build_json = || -> String {
            let mut builder = MapBuilder::new("determinism", 24, 16).with_seed(42);
            builder
                .add_element(
                    FillElement::new("meadow", 0).with_tiles(
                        TileGroup::new("ground")
                            .add_tile(TileSpec::new("grass").rate(4))
                            .add_tile(TileSpec::new("dirt").rate(1)),
                    ),
                )
                .unwrap();
            builder
                .add_element(
                    crate::elements::ScatterElement::new(
                        "pond",
                        1,
                        crate::elements::ScatterNoise::Perlin {
                            scale: 6.0,
                            octaves: 2,
                        },
                        crate::elements::ScatterMask::Above(0.7),
                    )
                    .with_tiles(
                        TileGroup::new("water").add_auto_tile(AutoTileSpec::new("water")),
                    ),
                )
                .unwrap();
            builder.build().unwrap();
            serde_json::to_string(&builder.map_document().unwrap()).unwrap()
        };

        assert_eq!(build_json(), build_json());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let build_json = |seed: u64| -> String {
            let mut builder = MapBuilder::new("diverge", 16, 16).with_seed(seed);
            builder
                .add_element(
                    FillElement::new("meadow", 0).with_tiles(
                        TileGroup::new("ground")
                            .add_tile(TileSpec::new("grass").rate(1))
                            .add_tile(TileSpec::new("dirt").rate(1)),
                    ),
                )
                .unwrap();
            builder.build().unwrap();
            serde_json::to_string(&builder.map_document().unwrap()).unwrap()
        };

        assert_ne!(build_json(1), build_json(2));
    }

    #[test]
    fn test_export_round_trip() {
        let mut builder = MapBuilder::new("roundtrip", 12, 10).with_seed(5);
        builder
            .add_element(FillElement::new("meadow", 0).with_tiles(grass_group()))
            .unwrap();
        builder
            .add_element(
                FillElement::new("shore", 1).region(2, 2, 4, 3).with_tiles(
                    TileGroup::new("water").add_auto_tile(AutoTileSpec::new("water")),
                ),
            )
            .unwrap();
        builder.build().unwrap();

        let json = serde_json::to_string(&builder.map_document().unwrap()).unwrap();
        let parsed: MapDocument = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.orientation, "orthogonal");
        assert_eq!(parsed.renderorder, "right-down");
        for layer in &parsed.layers {
            assert_eq!(layer.data.len(), (12 * 10) as usize);
        }
        // Every non-zero gid falls inside exactly one tileset's range.
        let mut ranges: Vec<(u32, u32)> = parsed
            .tilesets
            .iter()
            .map(|t| (t.firstgid, t.firstgid + t.tilecount))
            .collect();
        ranges.sort();
        for layer in &parsed.layers {
            for &gid in layer.data.iter().filter(|&&g| g != 0) {
                assert_eq!(
                    ranges.iter().filter(|(lo, hi)| gid >= *lo && gid < *hi).count(),
                    1,
                    "gid {} must resolve to one tileset",
                    gid
                );
            }
        }
    }

    #[test]
    fn test_autotile_gids_follow_resolution() {
        // A full-region autotile fill: interior cells emit the interior
        // sprite, the region corner emits a different edge sprite.
        let mut builder = MapBuilder::new("edges", 10, 10).with_layers(1).with_seed(2);
        builder
            .add_element(
                FillElement::new("lake", 0).region(2, 2, 5, 5).with_tiles(
                    TileGroup::new("water").add_auto_tile(AutoTileSpec::new("water")),
                ),
            )
            .unwrap();
        builder.build().unwrap();

        let cache = builder.cache().unwrap();
        let table = Blob47Table::new();
        let interior = cache.get_tile(4, 4, 0).unwrap();
        assert_eq!(interior.local, u32::from(Blob47Table::INTERIOR_INDEX));
        let corner = cache.get_tile(2, 2, 0).unwrap();
        // Corner of an interior region: S and E present plus SE diagonal.
        assert_eq!(
            corner.local,
            u32::from(table.index(crate::autotile::bits::S | crate::autotile::bits::E | crate::autotile::bits::SE))
        );
        assert_ne!(corner.local, interior.local);
    }

    #[test]
    fn test_aborting_element_discards_cache() {
        let mut builder = MapBuilder::new("oob", 8, 8).with_seed(1);
        builder
            .add_element(RectElement::new("outside", 6, 6, 4, 4, 0))
            .unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BuildError::BuildAborted { .. }));
        assert!(builder.cache().is_none());
        assert!(matches!(
            builder.map_document(),
            Err(BuildError::MapNotBuilt)
        ));
    }

    #[test]
    fn test_export_before_build_fails() {
        let builder = MapBuilder::new("early", 8, 8);
        assert!(matches!(
            builder.map_document(),
            Err(BuildError::MapNotBuilt)
        ));
    }

    #[test]
    fn test_double_build_rejected() {
        let mut builder = MapBuilder::new("twice", 8, 8).with_layers(1).with_seed(1);
        builder
            .add_element(FillElement::new("meadow", 0).with_tiles(grass_group()))
            .unwrap();
        builder.build().unwrap();
        assert!(matches!(
            builder.build(),
            Err(BuildError::InvariantViolated(_))
        ));
    }

    #[test]
    fn test_override_merging_fills_missing_groups() {
        // Overrides replace the declared group; the element still builds
        // with defaults when the override set omits it.
        let mut builder = MapBuilder::new("merge", 8, 8).with_layers(1).with_seed(4);
        let overrides = ResourceSet::new().add_tile_group(
            TileGroup::new(FillElement::TILES).add_tile(TileSpec::new("sand")),
        );
        builder
            .add_element_with(FillElement::new("beach", 0), overrides)
            .unwrap();
        builder.build().unwrap();

        let cache = builder.cache().unwrap();
        assert!(cache.get_layer(0).all(|(_, _, t)| t.resource_id == "sand"));
    }
}
