use crate::catalog::ProductCatalog;
use fitrs_vision::{ProductKind, SpriteProvider};
use image::DynamicImage;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Sprite images loaded on first use and kept for the life of the process.
///
/// Slots are created up front for every file the catalog mentions and for
/// every PNG already in the sprite directory, so products outside the
/// catalog (`scarf` -> `scarf.png`) can still be fitted. Each slot is filled
/// at most once and never modified afterwards.
pub struct SpriteCache {
    dir: PathBuf,
    catalog: ProductCatalog,
    slots: HashMap<String, OnceCell<Option<DynamicImage>>>,
}

impl SpriteCache {
    pub fn new(dir: impl Into<PathBuf>, catalog: &ProductCatalog) -> Self {
        let dir = dir.into();
        let slots = catalog
            .sprite_files()
            .into_iter()
            .chain(png_files(&dir))
            .map(|file| (file, OnceCell::new()))
            .collect();
        Self {
            dir,
            catalog: catalog.clone(),
            slots,
        }
    }

    /// Sprite stored under `file`, loading it on first access.
    pub fn get(&self, file: &str) -> Option<&DynamicImage> {
        let slot = self.slots.get(file)?;
        slot.get_or_init(|| load_sprite(&self.dir.join(file))).as_ref()
    }

    /// Number of sprites loaded so far.
    pub fn loaded(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot.get(), Some(Some(_))))
            .count()
    }
}

fn png_files(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("sprite dir {} not listed: {}", dir.display(), e);
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect()
}

fn load_sprite(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(img) => {
            if !img.color().has_alpha() {
                log::warn!(
                    "sprite {} has no alpha channel ({:?})",
                    path.display(),
                    img.color()
                );
            }
            log::debug!(
                "loaded sprite {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            );
            Some(img)
        }
        Err(e) => {
            log::warn!("failed to load sprite {}: {}", path.display(), e);
            None
        }
    }
}

impl SpriteProvider for SpriteCache {
    fn sprite(&self, kind: &ProductKind, product_id: &str) -> Option<&DynamicImage> {
        self.get(&self.catalog.sprite_file(kind, product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fitrs-sprites-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_once_per_file() {
        let dir = scratch("once");
        RgbaImage::from_pixel(30, 10, Rgba([0, 0, 0, 255]))
            .save(dir.join("glasses.png"))
            .unwrap();

        let catalog = ProductCatalog::builtin().unwrap();
        let cache = SpriteCache::new(&dir, &catalog);
        assert_eq!(cache.loaded(), 0);

        let a = cache.sprite(&ProductKind::Glasses, "classic_aviator").unwrap();
        assert_eq!((a.width(), a.height()), (30, 10));
        let b = cache.sprite(&ProductKind::Glasses, "round_retro").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(cache.loaded(), 1);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_sprite_outside_catalog() {
        let dir = scratch("extra");
        RgbaImage::from_pixel(20, 20, Rgba([0, 90, 0, 255]))
            .save(dir.join("scarf.png"))
            .unwrap();

        let catalog = ProductCatalog::builtin().unwrap();
        let cache = SpriteCache::new(&dir, &catalog);
        let scarf = cache.sprite(&ProductKind::parse("scarf"), "wool").unwrap();
        assert_eq!((scarf.width(), scarf.height()), (20, 20));
        assert!(cache.sprite(&ProductKind::parse("belt"), "x").is_none());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_file() {
        let dir = scratch("missing");
        let catalog = ProductCatalog::builtin().unwrap();
        let cache = SpriteCache::new(&dir, &catalog);
        assert!(cache.sprite(&ProductKind::Hat, "fedora").is_none());
        assert!(cache.sprite(&ProductKind::parse("scarf"), "x").is_none());
        assert!(cache.get("not-in-catalog.png").is_none());
        std::fs::remove_dir_all(dir).ok();
    }
}
