use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use usvg::fontdb;

use crate::foundation::error::{StoryError, StoryResult};

/// Family names tried, in order, before the generic sans-serif fallback.
pub const DEFAULT_FONT_FAMILIES: [&str; 4] = ["Arial", "Calibri", "DejaVu Sans", "Liberation Sans"];

/// Where fonts are looked up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSource {
    /// Family names in preference order.
    pub families: Vec<String>,
    /// Extra directory scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dir: Option<PathBuf>,
    /// Whether installed system fonts are loaded.
    pub system_fonts: bool,
}

impl Default for FontSource {
    fn default() -> Self {
        Self {
            families: DEFAULT_FONT_FAMILIES.iter().map(|s| s.to_string()).collect(),
            font_dir: None,
            system_fonts: true,
        }
    }
}

/// A resolved font face at one pixel size.
#[derive(Clone)]
pub struct FontHandle {
    /// Pixel size this handle was resolved for.
    pub size_px: u32,
    /// Family name reported by the font.
    pub family: String,
    /// Face index inside a collection file.
    pub face_index: u32,
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("size_px", &self.size_px)
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Read-through cache of resolved fonts keyed by pixel size.
///
/// Owned by a session and shared read-only with overlay workers. Each key is populated at most
/// once; concurrent misses may resolve twice but only the first insert is kept.
pub struct FontCache {
    db: fontdb::Database,
    families: Vec<String>,
    resolved: RwLock<HashMap<u32, Arc<FontHandle>>>,
    face_bytes: RwLock<HashMap<fontdb::ID, Arc<Vec<u8>>>>,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("faces", &self.db.len())
            .field("families", &self.families)
            .field("cached_sizes", &self.cached_sizes())
            .finish()
    }
}

impl FontCache {
    /// Build a cache from a font source, scanning system fonts and the extra directory.
    pub fn new(source: &FontSource) -> Self {
        let mut db = fontdb::Database::new();
        if source.system_fonts {
            db.load_system_fonts();
        }
        if let Some(dir) = source.font_dir.as_deref() {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database loaded");
        Self::with_database(db, source.families.clone())
    }

    /// Build a cache over an already populated font database.
    pub fn with_database(db: fontdb::Database, families: Vec<String>) -> Self {
        Self {
            db,
            families,
            resolved: RwLock::new(HashMap::new()),
            face_bytes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of font faces available for resolution.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Sizes resolved so far, ascending.
    pub fn cached_sizes(&self) -> Vec<u32> {
        let mut sizes = match self.resolved.read() {
            Ok(map) => map.keys().copied().collect::<Vec<_>>(),
            Err(poisoned) => poisoned.into_inner().keys().copied().collect(),
        };
        sizes.sort_unstable();
        sizes
    }

    /// Resolve the font for `size_px`, consulting the cache first.
    pub fn get(&self, size_px: u32) -> StoryResult<Arc<FontHandle>> {
        if size_px == 0 {
            return Err(StoryError::font("font size must be > 0"));
        }
        if let Some(hit) = self.read_cached(size_px) {
            return Ok(hit);
        }

        let handle = Arc::new(self.resolve(size_px)?);
        let mut map = self
            .resolved
            .write()
            .map_err(|_| StoryError::font("font cache lock poisoned"))?;
        Ok(map.entry(size_px).or_insert(handle).clone())
    }

    fn read_cached(&self, size_px: u32) -> Option<Arc<FontHandle>> {
        self.resolved.read().ok()?.get(&size_px).cloned()
    }

    fn resolve(&self, size_px: u32) -> StoryResult<FontHandle> {
        let id = self
            .query_named()
            .or_else(|| self.query(&[fontdb::Family::SansSerif]))
            .or_else(|| self.db.faces().next().map(|face| face.id))
            .ok_or_else(|| StoryError::font("no font faces available on this system"))?;

        let face = self
            .db
            .face(id)
            .ok_or_else(|| StoryError::font("resolved font face vanished from database"))?;
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| face.post_script_name.clone());

        let bytes = self.face_bytes(id, &family)?;

        tracing::debug!(size_px, %family, face_index = face.index, "resolved subtitle font");
        Ok(FontHandle {
            size_px,
            family,
            face_index: face.index,
            bytes,
        })
    }

    /// Font file bytes for a face, loaded once and shared by every size that resolves to it.
    fn face_bytes(&self, id: fontdb::ID, family: &str) -> StoryResult<Arc<Vec<u8>>> {
        if let Some(hit) = self.face_bytes.read().ok().and_then(|m| m.get(&id).cloned()) {
            return Ok(hit);
        }
        let bytes = self
            .db
            .with_face_data(id, |data, _| Arc::new(data.to_vec()))
            .ok_or_else(|| StoryError::font(format!("failed to load data for font '{family}'")))?;
        let mut map = self
            .face_bytes
            .write()
            .map_err(|_| StoryError::font("font cache lock poisoned"))?;
        Ok(map.entry(id).or_insert(bytes).clone())
    }

    fn query_named(&self) -> Option<fontdb::ID> {
        self.families
            .iter()
            .find_map(|name| self.query(&[fontdb::Family::Name(name.as_str())]))
    }

    fn query(&self, families: &[fontdb::Family<'_>]) -> Option<fontdb::ID> {
        self.db.query(&fontdb::Query {
            families,
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })
    }
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font file");
        }
    }
}

/// Subtitle font size for a frame width: `width / 25`, clamped to `[min_px, max_px]`.
pub fn responsive_font_size(frame_width: u32, divisor: u32, min_px: u32, max_px: u32) -> u32 {
    (frame_width / divisor.max(1)).clamp(min_px, max_px.max(min_px))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
