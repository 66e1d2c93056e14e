use anyhow::{Context, Result};
use gbf_data::ConfidenceSettings;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::matcher::Template;

const EXTENSIONS: &[&str] = &["png", "webp", "jpg"];

/// Partition of the asset namespace. Each category has its own folder and
/// its own confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Tappable elements
    Button,
    /// Full-screen identity markers used to confirm the current screen
    Header,
    Summon,
    Item,
    Dialog,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Button,
        Category::Header,
        Category::Summon,
        Category::Item,
        Category::Dialog,
    ];

    pub fn dir(self) -> &'static str {
        match self {
            Self::Button => "buttons",
            Self::Header => "headers",
            Self::Summon => "summons",
            Self::Item => "items",
            Self::Dialog => "dialogs",
        }
    }

    pub fn threshold(self, confidence: &ConfidenceSettings) -> f64 {
        match self {
            Self::Button => confidence.buttons,
            Self::Header => confidence.headers,
            Self::Summon => confidence.summons,
            Self::Item => confidence.items,
            Self::Dialog => confidence.dialogs,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Reference images loaded on first use and kept for the whole run
pub struct TemplateStore {
    root: PathBuf,
    scale: f64,
    cache: Mutex<HashMap<(Category, String), Arc<Template>>>,
}

impl TemplateStore {
    /// Templates live under `root/<category dir>/<name>.<ext>`. `scale` is
    /// applied once at load.
    pub fn new(root: impl Into<PathBuf>, scale: f64) -> Self {
        let root = root.into();
        info!("Template store at {} (scale {})", root.display(), scale);
        Self {
            root,
            scale,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str, category: Category) -> Result<Arc<Template>> {
        let key = (category, name.to_string());
        if let Some(t) = self.lock().get(&key) {
            return Ok(Arc::clone(t));
        }

        let template = Arc::new(self.load(name, category)?);
        self.lock().insert(key, Arc::clone(&template));
        Ok(template)
    }

    /// Register an already decoded template, bypassing the filesystem
    pub fn insert(&self, category: Category, template: Template) {
        self.lock()
            .insert((category, template.name.clone()), Arc::new(template));
    }

    /// Size of a named template, looked up across categories (buttons first).
    /// Used to aim taps inside the element.
    pub fn dimensions(&self, name: &str) -> Option<(u32, u32)> {
        Category::ALL
            .iter()
            .find_map(|c| self.get(name, *c).ok())
            .map(|t| t.dimensions())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Category, String), Arc<Template>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, name: &str, category: Category) -> Result<Template> {
        let dir = self.root.join(category.dir());
        let path = EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|p| p.exists())
            .with_context(|| format!("No {} template named {} in {}", category, name, dir.display()))?;

        let img = image::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut gray = img.to_luma8();
        if (self.scale - 1.0).abs() > f64::EPSILON {
            let w = ((gray.width() as f64 * self.scale).round() as u32).max(1);
            let h = ((gray.height() as f64 * self.scale).round() as u32).max(1);
            gray = image::imageops::resize(&gray, w, h, FilterType::Triangle);
        }
        debug!("Loaded template {}/{} ({}x{})", category, name, gray.width(), gray.height());
        Ok(Template::new(name, gray))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::tests::noise;

    fn write_asset(root: &Path, category: Category, name: &str, w: u32, h: u32) {
        let dir = root.join(category.dir());
        std::fs::create_dir_all(&dir).unwrap();
        noise(w, h, 3).save(dir.join(format!("{}.png", name))).unwrap();
    }

    #[test]
    fn test_loads_and_caches_by_category() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), Category::Button, "ok", 60, 30);
        write_asset(dir.path(), Category::Header, "home", 200, 40);

        let store = TemplateStore::new(dir.path(), 1.0);
        let ok = store.get("ok", Category::Button).unwrap();
        assert_eq!(ok.dimensions(), (60, 30));
        assert!(Arc::ptr_eq(&ok, &store.get("ok", Category::Button).unwrap()));
        assert!(store.get("ok", Category::Header).is_err());
        assert_eq!(store.dimensions("home"), Some((200, 40)));
        assert_eq!(store.dimensions("missing"), None);
    }

    #[test]
    fn test_scale_applied_at_load() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), Category::Button, "close", 80, 40);
        let store = TemplateStore::new(dir.path(), 0.5);
        assert_eq!(store.dimensions("close"), Some((40, 20)));
    }

    #[test]
    fn test_category_thresholds() {
        let confidence = ConfidenceSettings {
            summons: 0.7,
            ..ConfidenceSettings::default()
        };
        assert_eq!(Category::Summon.threshold(&confidence), 0.7);
        assert_eq!(Category::Header.threshold(&confidence), 0.8);
    }
}
