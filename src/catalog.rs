use anyhow::{Context, Result};
use fitrs_vision::dimensions::{GlassesDimensions, HatDimensions};
use fitrs_vision::{Catalog, ProductDimensions, ProductKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassesEntry {
    pub name: String,
    #[serde(default)]
    pub fit_type: String,
    /// Sprite file name inside the sprite directory.
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(flatten)]
    pub dimensions: GlassesDimensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatEntry {
    pub name: String,
    #[serde(default)]
    pub fit_type: String,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(flatten)]
    pub dimensions: HatDimensions,
}

/// Products keyed by category and id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub glasses: BTreeMap<String, GlassesEntry>,
    #[serde(default)]
    pub hat: BTreeMap<String, HatEntry>,
}

impl ProductCatalog {
    pub fn builtin() -> Result<Self> {
        toml::from_str(BUILTIN_CATALOG).context("parsing built-in catalog")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog at {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing catalog {}", path.display()))
    }

    /// Catalog from `path` if given, the built-in one otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.glasses.len() + self.hat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sprite file for a product: the entry's own sprite, else `<kind>.png`.
    pub fn sprite_file(&self, kind: &ProductKind, id: &str) -> String {
        let own = match kind {
            ProductKind::Glasses => self.glasses.get(id).and_then(|e| e.sprite.clone()),
            ProductKind::Hat => self.hat.get(id).and_then(|e| e.sprite.clone()),
            ProductKind::Other(_) => None,
        };
        own.unwrap_or_else(|| format!("{}.png", kind.as_str()))
    }

    /// Every sprite file the catalog can refer to.
    pub fn sprite_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .glasses
            .values()
            .filter_map(|e| e.sprite.clone())
            .chain(self.hat.values().filter_map(|e| e.sprite.clone()))
            .chain(["glasses.png".to_string(), "hat.png".to_string()])
            .collect();
        files.sort();
        files.dedup();
        files
    }
}

impl Catalog for ProductCatalog {
    fn dimensions(&self, kind: &ProductKind, id: &str) -> Option<ProductDimensions> {
        match kind {
            ProductKind::Glasses => self
                .glasses
                .get(id)
                .map(|e| ProductDimensions::Glasses(e.dimensions.clone())),
            ProductKind::Hat => self
                .hat
                .get(id)
                .map(|e| ProductDimensions::Hat(e.dimensions.clone())),
            ProductKind::Other(_) => None,
        }
    }
}
