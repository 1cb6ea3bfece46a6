//! System font fallback over a `fontdb` database
//!
//! For each query the service answers: which face draws the grapheme
//! cluster at `offset`, and for how many code units that stays true. The
//! requested family always wins when it covers a cluster; other faces are
//! tried in configured-family order, then in database order.
//!
//! ## Thread safety
//!
//! `SystemFontFallback` is `Send + Sync` and safe to call from several
//! threads at once. The database is read-only after construction and every
//! cache sits behind a `parking_lot::Mutex`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdb::{Database, Family, Query, Source, ID};
use glyphmap_core::{
    analysis::utf16_scalars,
    error::{FontError, Result},
    traits::{FontFace, FontFallback},
    types::{FaceId, FallbackRun},
    TextAnalysisSource,
};
use glyphmap_unicode::grapheme_boundaries;
use lru::LruCache;
use parking_lot::Mutex;
use read_fonts::{FontRef, TableProvider};

use crate::face::FontFile;

/// Coverage answers kept per (face, character)
pub const DEFAULT_COVERAGE_CACHE_SIZE: usize = 16 * 1024;

/// Characters that never decide which face draws a cluster
///
/// Controls, joiners, variation selectors and bidi formatting characters
/// are invisible or modify their neighbours; a face lacking them still
/// draws the cluster.
pub fn is_default_ignorable(ch: char) -> bool {
    ch.is_control()
        || matches!(ch,
            '\u{00AD}'
            | '\u{034F}'
            | '\u{180B}'..='\u{180F}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{206F}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{FEFF}'
            | '\u{E0000}'..='\u{E0FFF}')
}

/// Where the bytes of a database face come from
///
/// Faces of one collection file share a key, and so share one buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    File(PathBuf),
    /// Address of the in-memory buffer handed to the database
    Memory(usize),
}

impl SourceKey {
    fn of(source: &Source) -> Self {
        match source {
            Source::File(path) | Source::SharedFile(path, _) => SourceKey::File(path.clone()),
            Source::Binary(data) => SourceKey::Memory(Arc::as_ptr(data) as *const u8 as usize),
        }
    }
}

/// Font fallback backed by the installed fonts
pub struct SystemFontFallback {
    db: Database,
    fallback_families: Vec<String>,
    families: Mutex<HashMap<String, Option<ID>>>,
    faces: Mutex<HashMap<ID, Option<Arc<FontFile>>>>,
    sources: Mutex<HashMap<SourceKey, Arc<Vec<u8>>>>,
    coverage: Mutex<LruCache<(ID, char), bool>>,
}

impl SystemFontFallback {
    /// Wraps an already populated database
    pub fn new(db: Database) -> Self {
        Self {
            db,
            fallback_families: Vec::new(),
            families: Mutex::new(HashMap::new()),
            faces: Mutex::new(HashMap::new()),
            sources: Mutex::new(HashMap::new()),
            coverage: Mutex::new(LruCache::new(coverage_capacity(DEFAULT_COVERAGE_CACHE_SIZE))),
        }
    }

    /// Every font the operating system exposes
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} system font faces", db.len());
        Self::new(db)
    }

    /// Families tried before database order when the base family lacks a character
    pub fn with_fallback_families(mut self, families: Vec<String>) -> Self {
        self.fallback_families = families;
        self
    }

    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        *self.coverage.lock() = LruCache::new(coverage_capacity(capacity));
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Adds a font file; its faces join the end of the fallback order
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.db
            .load_font_file(path)
            .map_err(|_| FontError::FileNotFound(path.display().to_string()))?;
        self.invalidate();
        Ok(())
    }

    /// Adds font bytes; every face in them becomes available
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.families.get_mut().clear();
        self.faces.get_mut().clear();
        self.sources.get_mut().clear();
        self.coverage.get_mut().clear();
    }

    /// Number of faces the service can choose from
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// The face a family name resolves to; empty names mean sans-serif
    pub fn resolve_family(&self, family: Option<&str>) -> Option<ID> {
        let name = family.map(str::trim).unwrap_or_default();
        if let Some(&cached) = self.families.lock().get(name) {
            return cached;
        }

        let families = if name.is_empty() {
            vec![Family::SansSerif]
        } else {
            vec![Family::Name(name)]
        };
        let query = Query {
            families: &families,
            ..Query::default()
        };
        let mut found = self.db.query(&query);
        if found.is_none() && name.is_empty() {
            // No sans-serif alias configured: any face will do
            found = self.db.faces().next().map(|face| face.id);
        }
        if found.is_none() {
            log::debug!("Font family '{}' not found", name);
        }

        self.families.lock().insert(name.to_string(), found);
        found
    }

    /// Loads (or returns the cached) face for a database id
    pub fn face(&self, id: ID) -> Option<Arc<FontFile>> {
        if let Some(cached) = self.faces.lock().get(&id) {
            return cached.clone();
        }

        let family = self
            .db
            .face(id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()));
        let loaded = self
            .face_bytes(id)
            .map(|(data, index)| FontFile::from_shared_with_id(data, index, face_id(id)));

        let face = match loaded {
            Some(Ok(face)) => {
                let face = match family {
                    Some(family) => face.with_family(family),
                    None => face,
                };
                Some(Arc::new(face))
            },
            Some(Err(e)) => {
                log::warn!("Skipping unreadable font face {:?}: {}", id, e);
                None
            },
            None => None,
        };

        self.faces.lock().insert(id, face.clone());
        face
    }

    /// The bytes behind face `id` and its index in them, read once per source
    fn face_bytes(&self, id: ID) -> Option<(Arc<Vec<u8>>, u32)> {
        let (source, index) = self.db.face_source(id)?;
        let key = SourceKey::of(&source);
        if let Some(data) = self.sources.lock().get(&key) {
            return Some((data.clone(), index));
        }

        let data = self
            .db
            .with_face_data(id, |data, _| Arc::new(data.to_vec()))?;
        self.sources.lock().insert(key, data.clone());
        Some((data, index))
    }

    /// Whether face `id` maps `ch`, cached
    fn covers_char(&self, id: ID, ch: char) -> bool {
        if let Some(&known) = self.coverage.lock().get(&(id, ch)) {
            return known;
        }

        let covered = self
            .db
            .with_face_data(id, |data, index| {
                FontRef::from_index(data, index)
                    .ok()
                    .and_then(|font| font.cmap().ok())
                    .and_then(|cmap| cmap.map_codepoint(ch))
                    .is_some_and(|glyph| glyph.to_u32() != 0)
            })
            .unwrap_or(false);

        self.coverage.lock().put((id, ch), covered);
        covered
    }

    /// Whether face `id` draws every visible character of a cluster
    fn covers_cluster(&self, id: ID, cluster: &[char]) -> bool {
        cluster
            .iter()
            .filter(|&&ch| !is_default_ignorable(ch))
            .all(|&ch| self.covers_char(id, ch))
    }

    /// Base face first, then configured families, then database order
    fn pick_face(&self, base: Option<ID>, cluster: &[char]) -> Option<ID> {
        if let Some(base) = base {
            if self.covers_cluster(base, cluster) {
                return Some(base);
            }
        }

        for family in &self.fallback_families {
            if let Some(id) = self.resolve_family(Some(family)) {
                if Some(id) != base && self.covers_cluster(id, cluster) {
                    return Some(id);
                }
            }
        }

        self.db
            .faces()
            .map(|face| face.id)
            .filter(|&id| Some(id) != base)
            .find(|&id| self.covers_cluster(id, cluster))
    }
}

fn coverage_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

/// Stable per-process identity for a database face
fn face_id(id: ID) -> FaceId {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    FaceId(hasher.finish())
}

impl FontFallback for SystemFontFallback {
    fn map_characters(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        base_family: Option<&str>,
    ) -> Result<FallbackRun> {
        let text = source.slice(offset, length);
        if text.is_empty() {
            return Ok(FallbackRun {
                face: None,
                mapped_length: 0,
                scale: 1.0,
            });
        }

        let base = self.resolve_family(base_family);
        let boundaries = grapheme_boundaries(text);
        let mut clusters = boundaries.windows(2).map(|pair| {
            let units = &text[pair[0]..pair[1]];
            let chars: Vec<char> = utf16_scalars(units).map(|(_, ch, _)| ch).collect();
            (units.len() as u32, chars)
        });

        let Some((first_len, first_chars)) = clusters.next() else {
            return Ok(FallbackRun {
                face: None,
                mapped_length: text.len() as u32,
                scale: 1.0,
            });
        };

        let chosen = self.pick_face(base, &first_chars);
        let mut mapped_length = first_len;

        for (cluster_len, chars) in clusters {
            let keep = match chosen {
                Some(id) => {
                    self.covers_cluster(id, &chars)
                        && (Some(id) == base
                            || !base.is_some_and(|base| self.covers_cluster(base, &chars)))
                },
                None => self.pick_face(base, &chars).is_none(),
            };
            if !keep {
                break;
            }
            mapped_length += cluster_len;
        }

        let face = chosen
            .and_then(|id| self.face(id))
            .map(|face| face as Arc<dyn FontFace>);
        log::trace!(
            "Fallback {}..{} -> {}",
            offset,
            offset + mapped_length,
            face.as_ref().map(|f| f.family_name()).unwrap_or("<none>")
        );

        Ok(FallbackRun {
            face,
            mapped_length,
            scale: 1.0,
        })
    }

    fn last_resort_face(&self, base_family: Option<&str>) -> Option<Arc<dyn FontFace>> {
        self.resolve_family(base_family)
            .or_else(|| self.db.faces().next().map(|face| face.id))
            .and_then(|id| self.face(id))
            .map(|face| face as Arc<dyn FontFace>)
    }
}
