//! Declarative resource descriptors: tiles, auto-tiles, objects and their
//! weighted groups.
//!
//! Descriptors are pure data. Elements install them during resource setup,
//! the loader resolves them to textures, and nothing mutates them afterwards.
//! Groups are validated before any asset is touched: duplicate ids and
//! mixed tile/auto-tile groups are rejected outright.

use crate::error::BuildError;

/// A single-cell tile drawn by weighted choice within its group.
#[derive(Clone, Debug)]
pub struct TileSpec {
    pub resource_id: String,
    /// Image path; `None` renders the shared placeholder sprite.
    pub image: Option<String>,
    pub rate: u32,
    pub collision: bool,
    pub cover: bool,
}

impl TileSpec {
    pub fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            image: None,
            rate: 1,
            collision: false,
            cover: false,
        }
    }

    pub fn image(mut self, path: &str) -> Self {
        self.image = Some(path.to_string());
        self
    }

    pub fn rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn collision(mut self, collision: bool) -> Self {
        self.collision = collision;
        self
    }

    pub fn cover(mut self, cover: bool) -> Self {
        self.cover = cover;
        self
    }
}

/// A connected tile family rendered through the blob47 resolver.
///
/// The image is a composite sheet indexed by blob47 sprite index.
#[derive(Clone, Debug)]
pub struct AutoTileSpec {
    pub resource_id: String,
    pub image: Option<String>,
    pub rate: u32,
    pub collision: bool,
    pub cover: bool,
}

impl AutoTileSpec {
    pub fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            image: None,
            rate: 1,
            collision: false,
            cover: false,
        }
    }

    pub fn image(mut self, path: &str) -> Self {
        self.image = Some(path.to_string());
        self
    }

    pub fn rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn collision(mut self, collision: bool) -> Self {
        self.collision = collision;
        self
    }

    pub fn cover(mut self, cover: bool) -> Self {
        self.cover = cover;
        self
    }
}

/// A multi-cell object anchored at its top-left cell.
#[derive(Clone, Debug)]
pub struct ObjectSpec {
    pub resource_id: String,
    pub image: Option<String>,
    pub width: u32,
    pub height: u32,
    pub rate: u32,
    pub collision: bool,
    pub cover: bool,
    /// Interaction hooks as (verb, noun) pairs, e.g. ("open", "shop").
    pub functions: Vec<(String, String)>,
}

impl ObjectSpec {
    pub fn new(resource_id: &str, width: u32, height: u32) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            image: None,
            width,
            height,
            rate: 1,
            collision: false,
            cover: false,
            functions: Vec::new(),
        }
    }

    pub fn image(mut self, path: &str) -> Self {
        self.image = Some(path.to_string());
        self
    }

    pub fn rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn collision(mut self, collision: bool) -> Self {
        self.collision = collision;
        self
    }

    pub fn cover(mut self, cover: bool) -> Self {
        self.cover = cover;
        self
    }

    pub fn function(mut self, verb: &str, noun: &str) -> Self {
        self.functions.push((verb.to_string(), noun.to_string()));
        self
    }
}

/// A weighted union of tiles, or of a single auto-tile family.
///
/// Groups are homogeneous: unit tiles and auto-tiles never share a group,
/// since a per-cell weighted draw cannot mix a concrete sprite with a
/// family tag.
#[derive(Clone, Debug)]
pub struct TileGroup {
    pub id: String,
    tiles: Vec<TileSpec>,
    auto_tiles: Vec<AutoTileSpec>,
}

impl TileGroup {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tiles: Vec::new(),
            auto_tiles: Vec::new(),
        }
    }

    pub fn add_tile(mut self, tile: TileSpec) -> Self {
        self.tiles.push(tile);
        self
    }

    pub fn add_auto_tile(mut self, auto_tile: AutoTileSpec) -> Self {
        self.auto_tiles.push(auto_tile);
        self
    }

    pub fn tiles(&self) -> &[TileSpec] {
        &self.tiles
    }

    pub fn auto_tiles(&self) -> &[AutoTileSpec] {
        &self.auto_tiles
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.auto_tiles.is_empty()
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.tiles.is_empty() && !self.auto_tiles.is_empty() {
            return Err(BuildError::HeterogeneousGroup(self.id.clone()));
        }

        let mut seen: Vec<&str> = Vec::new();
        for id in self
            .tiles
            .iter()
            .map(|t| t.resource_id.as_str())
            .chain(self.auto_tiles.iter().map(|a| a.resource_id.as_str()))
        {
            if seen.contains(&id) {
                return Err(BuildError::DuplicateResource(id.to_string()));
            }
            seen.push(id);
        }
        Ok(())
    }
}

/// A weighted union of objects.
#[derive(Clone, Debug)]
pub struct ObjectGroup {
    pub id: String,
    objects: Vec<ObjectSpec>,
}

impl ObjectGroup {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            objects: Vec::new(),
        }
    }

    pub fn add_object(mut self, object: ObjectSpec) -> Self {
        self.objects.push(object);
        self
    }

    pub fn objects(&self) -> &[ObjectSpec] {
        &self.objects
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        let mut seen: Vec<&str> = Vec::new();
        for id in self.objects.iter().map(|o| o.resource_id.as_str()) {
            if seen.contains(&id) {
                return Err(BuildError::DuplicateResource(id.to_string()));
            }
            seen.push(id);
        }
        Ok(())
    }
}

/// Either kind of descriptor group.
#[derive(Clone, Debug)]
pub enum GroupSpec {
    Tiles(TileGroup),
    Objects(ObjectGroup),
}

impl GroupSpec {
    pub fn id(&self) -> &str {
        match self {
            GroupSpec::Tiles(g) => &g.id,
            GroupSpec::Objects(g) => &g.id,
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        match self {
            GroupSpec::Tiles(g) => g.validate(),
            GroupSpec::Objects(g) => g.validate(),
        }
    }
}

/// The ordered set of descriptor groups an element installs.
///
/// Order is load order, which makes tileset and family id allocation
/// deterministic for a fixed element sequence.
#[derive(Clone, Debug, Default)]
pub struct ResourceSet {
    groups: Vec<GroupSpec>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn add_tile_group(mut self, group: TileGroup) -> Self {
        self.groups.push(GroupSpec::Tiles(group));
        self
    }

    pub fn add_object_group(mut self, group: ObjectGroup) -> Self {
        self.groups.push(GroupSpec::Objects(group));
        self
    }

    pub fn get(&self, id: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupSpec> {
        self.groups.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Validate every group plus group id uniqueness across the set.
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut seen: Vec<&str> = Vec::new();
        for group in &self.groups {
            group.validate()?;
            if seen.contains(&group.id()) {
                return Err(BuildError::DuplicateResource(group.id().to_string()));
            }
            seen.push(group.id());
        }
        Ok(())
    }

    /// Complete an override set from an element's defaults.
    ///
    /// The defaults define the canonical group order; a default group is
    /// replaced by the override with the same id when one exists. Override
    /// groups with ids the defaults never mention are appended after.
    pub fn merge_defaults(self, defaults: ResourceSet) -> ResourceSet {
        let mut merged = Vec::new();
        for default_group in &defaults.groups {
            match self.get(default_group.id()) {
                Some(over) => merged.push(over.clone()),
                None => merged.push(default_group.clone()),
            }
        }
        for group in &self.groups {
            if defaults.get(group.id()).is_none() {
                merged.push(group.clone());
            }
        }
        ResourceSet { groups: merged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_resource_rejected() {
        let group = TileGroup::new("ground")
            .add_tile(TileSpec::new("grass"))
            .add_tile(TileSpec::new("grass"));
        assert_eq!(
            group.validate().unwrap_err(),
            BuildError::DuplicateResource("grass".to_string())
        );
    }

    #[test]
    fn test_heterogeneous_group_rejected() {
        let group = TileGroup::new("ground")
            .add_tile(TileSpec::new("grass"))
            .add_auto_tile(AutoTileSpec::new("water"));
        assert_eq!(
            group.validate().unwrap_err(),
            BuildError::HeterogeneousGroup("ground".to_string())
        );
    }

    #[test]
    fn test_duplicate_group_id_rejected() {
        let set = ResourceSet::new()
            .add_tile_group(TileGroup::new("ground").add_tile(TileSpec::new("grass")))
            .add_tile_group(TileGroup::new("ground").add_tile(TileSpec::new("dirt")));
        assert!(matches!(
            set.validate(),
            Err(BuildError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_merge_keeps_default_order_and_fills_missing() {
        let defaults = ResourceSet::new()
            .add_tile_group(TileGroup::new("ground").add_tile(TileSpec::new("grass")))
            .add_object_group(ObjectGroup::new("props"));
        let overrides = ResourceSet::new()
            .add_object_group(ObjectGroup::new("props").add_object(ObjectSpec::new("barrel", 1, 1)));

        let merged = overrides.merge_defaults(defaults);
        let ids: Vec<&str> = merged.iter().map(|g| g.id()).collect();
        assert_eq!(ids, vec!["ground", "props"]);
        match merged.get("props").unwrap() {
            GroupSpec::Objects(g) => assert_eq!(g.objects().len(), 1),
            _ => panic!("props should be an object group"),
        }
    }

    #[test]
    fn test_merge_appends_extra_override_groups() {
        let defaults =
            ResourceSet::new().add_tile_group(TileGroup::new("ground").add_tile(TileSpec::new("grass")));
        let overrides = ResourceSet::new()
            .add_tile_group(TileGroup::new("decor").add_tile(TileSpec::new("flower")));

        let merged = overrides.merge_defaults(defaults);
        let ids: Vec<&str> = merged.iter().map(|g| g.id()).collect();
        assert_eq!(ids, vec!["ground", "decor"]);
    }
}
