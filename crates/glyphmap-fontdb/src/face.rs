//! Font faces parsed with read-fonts
//!
//! Stores the raw data and creates a `FontRef` on demand for each lookup, so
//! a face owns no self-referential parse state and collections (TTC) work by
//! face index.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use glyphmap_core::{
    error::{FontError, Result},
    traits::FontFace,
    types::{FaceId, FontMetrics, GlyphId},
};
use read_fonts::{
    types::{GlyphId as ReadGlyphId, Tag},
    FontRef, TableProvider,
};
use skrifa::{
    instance::{LocationRef, Size},
    string::StringId,
    MetadataProvider,
};

/// GSUB features a shaper applies by default to horizontal text
const DEFAULT_SUBSTITUTION_FEATURES: [Tag; 4] = [
    Tag::new(b"liga"),
    Tag::new(b"clig"),
    Tag::new(b"calt"),
    Tag::new(b"rlig"),
];

/// One face of a font file, ready to map and shape text
pub struct FontFile {
    id: FaceId,
    family: String,
    data: Arc<Vec<u8>>,
    face_index: u32,
    metrics: FontMetrics,
    glyph_count: u16,
    default_substitutions: bool,
}

impl FontFile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_index(path, 0)
    }

    /// Opens one face of a font file (for TTC collections)
    pub fn from_file_index(path: impl AsRef<Path>, face_index: u32) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|_| FontError::FileNotFound(path.display().to_string()))?;
        Self::from_data_index(data, face_index)
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        Self::from_shared(Arc::new(data), face_index)
    }

    /// Parses a face out of data that may back several faces
    ///
    /// The face id is derived from the bytes and the index, so the same face
    /// loaded twice compares equal.
    pub fn from_shared(data: Arc<Vec<u8>>, face_index: u32) -> Result<Self> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        face_index.hash(&mut hasher);
        Self::from_shared_with_id(data, face_index, FaceId(hasher.finish()))
    }

    /// Parses a face whose identity is already known, e.g. from a font
    /// database; the bytes are not hashed
    pub fn from_shared_with_id(data: Arc<Vec<u8>>, face_index: u32, id: FaceId) -> Result<Self> {
        let font = FontRef::from_index(&data, face_index).map_err(|_| FontError::InvalidData)?;

        let units_per_em = font
            .head()
            .map(|head| head.units_per_em())
            .map_err(|_| FontError::InvalidData)?;
        let design = font.metrics(Size::unscaled(), LocationRef::default());
        let metrics = FontMetrics {
            design_units_per_em: units_per_em.max(1),
            ascent: design.ascent.round() as i16,
            descent: (-design.descent).round() as i16,
            line_gap: design.leading.round() as i16,
        };

        let glyph_count = font.maxp().map(|maxp| maxp.num_glyphs()).unwrap_or(0);
        let family = font
            .localized_strings(StringId::FAMILY_NAME)
            .english_or_first()
            .map(|name| name.chars().collect::<String>())
            .unwrap_or_default();
        let default_substitutions = has_default_substitutions(&font);

        Ok(Self {
            id,
            family,
            data,
            face_index,
            metrics,
            glyph_count,
            default_substitutions,
        })
    }

    /// Replaces the family name read from the `name` table
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// The bytes backing this face, shared with sibling faces of a collection
    pub fn shared_data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.face_index).ok()
    }
}

fn has_default_substitutions(font: &FontRef<'_>) -> bool {
    let Ok(gsub) = font.gsub() else {
        return false;
    };
    let Ok(features) = gsub.feature_list() else {
        return false;
    };
    features
        .feature_records()
        .iter()
        .any(|record| DEFAULT_SUBSTITUTION_FEATURES.contains(&record.feature_tag()))
}

impl FontFace for FontFile {
    fn id(&self) -> FaceId {
        self.id
    }

    fn family_name(&self) -> &str {
        &self.family
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn face_index(&self) -> u32 {
        self.face_index
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph_index(&self, ch: char) -> Option<GlyphId> {
        let glyph = self.font_ref()?.cmap().ok()?.map_codepoint(ch)?.to_u32();
        // Glyph 0 is .notdef, which means "not mapped"
        GlyphId::try_from(glyph).ok().filter(|&glyph| glyph != 0)
    }

    fn design_glyph_advance(&self, glyph: GlyphId) -> Option<i32> {
        let hmtx = self.font_ref()?.hmtx().ok()?;
        hmtx.advance(ReadGlyphId::new(glyph as u32))
            .map(i32::from)
    }

    fn design_glyph_advances(&self, glyphs: &[GlyphId]) -> Result<Vec<i32>> {
        let font = self.font_ref().ok_or(FontError::InvalidData)?;
        let hmtx = font.hmtx().map_err(|_| FontError::InvalidData)?;
        Ok(glyphs
            .iter()
            .map(|&glyph| {
                hmtx.advance(ReadGlyphId::new(glyph as u32))
                    .map(i32::from)
                    .unwrap_or(0)
            })
            .collect())
    }

    fn has_default_substitutions(&self) -> bool {
        self.default_substitutions
    }

    fn covers(&self, chars: &[char]) -> bool {
        let Some(font) = self.font_ref() else {
            return false;
        };
        let Ok(cmap) = font.cmap() else {
            return false;
        };
        chars.iter().all(|&ch| {
            cmap.map_codepoint(ch)
                .is_some_and(|glyph| glyph.to_u32() != 0)
        })
    }
}

impl std::fmt::Debug for FontFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFile")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("glyph_count", &self.glyph_count)
            .finish()
    }
}
