//! Pure Rust text analysis backend using harfrust
//!
//! Harfrust is a pure Rust port of HarfBuzz. This analyzer uses it for both
//! shaping phases: `get_glyphs` shapes in font units and keeps the design
//! advances and offsets, `get_glyph_placements` scales them to the requested
//! size. Script and bidi analysis come from `glyphmap-unicode`.
//!
//! Per-face shaper state (`ShaperData`) is built once and kept in a small
//! LRU cache. A run that overflowed the caller's glyph buffer is kept until
//! the caller retries with a larger one, so retries never reshape.
//!
//! Both caches sit behind `parking_lot` mutexes; one instance can be shared
//! across threads and called concurrently.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

use harfrust::{
    Direction as HrDirection, FontRef as HrFontRef, GlyphBuffer, Language, Script, ShaperData,
    Tag, UnicodeBuffer,
};

use glyphmap_core::{
    analysis::{utf16_scalars, AnalysisSink, TextAnalysisSource},
    error::{FontError, GlyphMapError, Result},
    traits::{FontFace, TextAnalyzer},
    types::{
        FaceId, GlyphId, GlyphOffset, GlyphPlacements, ScriptAnalysis, ScriptShapes, ScriptTag,
        ShapedGlyphs, ShapingGlyphProperties, ShapingTextProperties, TextComplexity,
    },
};
use glyphmap_unicode::UnicodeAnalysis;
use lru::LruCache;
use parking_lot::Mutex;

/// Faces whose shaper state stays cached
pub const DEFAULT_SHAPER_CACHE_SIZE: usize = 16;

/// Everything that decides a shaping result
#[derive(Debug, Clone, PartialEq)]
struct RunKey {
    face: FaceId,
    text: Vec<u16>,
    is_right_to_left: bool,
    script: ScriptTag,
    locale: String,
}

/// Text analyzer powered by harfrust
pub struct HarfrustAnalyzer {
    unicode: UnicodeAnalysis,
    shapers: Mutex<LruCache<FaceId, Arc<ShaperData>>>,
    overflowed: Mutex<Option<(RunKey, ShapedGlyphs)>>,
}

impl Default for HarfrustAnalyzer {
    fn default() -> Self {
        Self::with_cache_capacity(DEFAULT_SHAPER_CACHE_SIZE)
    }
}

impl HarfrustAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            unicode: UnicodeAnalysis::default(),
            shapers: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            overflowed: Mutex::new(None),
        }
    }

    /// Number of faces with cached shaper state
    pub fn cached_faces(&self) -> usize {
        self.shapers.lock().len()
    }

    fn shaper_data(&self, face: &dyn FontFace, font: &HrFontRef<'_>) -> Arc<ShaperData> {
        let mut shapers = self.shapers.lock();
        if let Some(data) = shapers.get(&face.id()) {
            return data.clone();
        }
        let data = Arc::new(ShaperData::new(font));
        shapers.put(face.id(), data.clone());
        data
    }

    /// Shapes `text` in font units; glyphs come back in visual order
    fn shape(
        &self,
        text: &[u16],
        face: &dyn FontFace,
        is_right_to_left: bool,
        script: ScriptAnalysis,
        locale: &str,
    ) -> Result<GlyphBuffer> {
        if face.data().is_empty() {
            return Err(GlyphMapError::platform(format!(
                "face '{}' has no font data to shape with",
                face.family_name()
            )));
        }

        let font = HrFontRef::from_index(face.data(), face.face_index())
            .map_err(|_| FontError::InvalidData)?;
        let shaper_data = self.shaper_data(face, &font);
        // No point size: positions stay in font units
        let shaper = shaper_data.shaper(&font).build();

        let mut buffer = UnicodeBuffer::new();
        for (offset, ch, _) in utf16_scalars(text) {
            buffer.add(ch, offset);
        }
        buffer.set_direction(if is_right_to_left {
            HrDirection::RightToLeft
        } else {
            HrDirection::LeftToRight
        });

        if script.script.is_significant() {
            if let Some(script) = Script::from_iso15924_tag(Tag::new(&script.script.0)) {
                buffer.set_script(script);
            }
        }
        if !locale.is_empty() {
            if let Ok(language) = Language::from_str(locale) {
                buffer.set_language(language);
            }
        }
        buffer.guess_segment_properties();

        Ok(shaper.shape(buffer, &[]))
    }

    /// Shapes a run and converts it to logical-order glyph data
    fn shape_run(
        &self,
        text: &[u16],
        face: &dyn FontFace,
        is_right_to_left: bool,
        script: ScriptAnalysis,
        locale: &str,
    ) -> Result<ShapedGlyphs> {
        let output = self.shape(text, face, is_right_to_left, script, locale)?;
        let glyph_count = output.len();
        if glyph_count > u16::MAX as usize {
            return Err(GlyphMapError::InvalidInput(format!(
                "run shapes to {glyph_count} glyphs, more than a cluster map can index"
            )));
        }

        let mut glyphs: Vec<_> = output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .collect();
        // Harfrust emits right-to-left runs in visual order
        if is_right_to_left {
            glyphs.reverse();
        }

        let clusters: Vec<u32> = glyphs.iter().map(|(info, _)| info.cluster).collect();
        let cluster_map = build_cluster_map(text.len(), &clusters);
        let invisible = script.shapes == ScriptShapes::NoVisual;

        let mut glyph_indices = Vec::with_capacity(glyph_count);
        let mut glyph_props = Vec::with_capacity(glyph_count);
        for (index, (info, position)) in glyphs.iter().enumerate() {
            let glyph = GlyphId::try_from(info.glyph_id).map_err(|_| {
                GlyphMapError::platform(format!("glyph id {} out of range", info.glyph_id))
            })?;
            let is_cluster_start = index == 0 || clusters[index - 1] != info.cluster;
            let cluster_unit = text.get(info.cluster as usize).copied();
            // Offsets point along the reading direction
            let advance_offset = if is_right_to_left {
                -position.x_offset
            } else {
                position.x_offset
            };

            glyph_indices.push(glyph);
            glyph_props.push(ShapingGlyphProperties {
                is_cluster_start,
                is_diacritic: !is_cluster_start,
                is_zero_width_space: cluster_unit == Some(0x200B),
                design_advance: if invisible { 0 } else { position.x_advance },
                design_offset: (advance_offset, position.y_offset),
            });
        }

        let text_props = (0..text.len())
            .map(|unit| ShapingTextProperties {
                is_shaped_alone: false,
                can_break_shaping_after: unit + 1 == text.len()
                    || cluster_map[unit + 1] != cluster_map[unit],
            })
            .collect();

        log::trace!(
            "Shaped {} code units into {} glyphs ({})",
            text.len(),
            glyph_count,
            if is_right_to_left { "rtl" } else { "ltr" }
        );

        Ok(ShapedGlyphs {
            cluster_map,
            text_props,
            glyph_indices,
            glyph_props,
        })
    }
}

/// For each code unit, the logical index of the first glyph of its cluster
fn build_cluster_map(text_len: usize, clusters: &[u32]) -> Vec<u16> {
    let mut starts: Vec<(u32, u16)> = Vec::new();
    for (index, &cluster) in clusters.iter().enumerate() {
        if starts.last().map(|&(c, _)| c) != Some(cluster) {
            starts.push((cluster, index as u16));
        }
    }

    let mut map = Vec::with_capacity(text_len);
    let mut cursor = 0usize;
    for unit in 0..text_len as u32 {
        while cursor + 1 < starts.len() && starts[cursor + 1].0 <= unit {
            cursor += 1;
        }
        map.push(starts.get(cursor).map(|&(_, glyph)| glyph).unwrap_or(0));
    }
    map
}

impl TextAnalyzer for HarfrustAnalyzer {
    fn name(&self) -> &'static str {
        "Harfrust"
    }

    fn text_complexity(&self, text: &[u16], face: &dyn FontFace) -> Result<TextComplexity> {
        if text.is_empty() {
            return Err(GlyphMapError::InvalidInput(
                "complexity of empty text".to_string(),
            ));
        }

        // Ligatures and contextual alternates need the shaper even for ASCII
        if face.has_default_substitutions() {
            return Ok(TextComplexity {
                is_simple: false,
                mapped_length: text.len() as u32,
                glyph_indices: Vec::new(),
            });
        }

        let (is_simple, length) = self
            .unicode
            .classifier()
            .classify_prefix(text, |ch| face.glyph_index(ch).is_some());

        let glyph_indices = if is_simple {
            text[..length]
                .iter()
                .map(|&unit| {
                    char::from_u32(unit as u32)
                        .and_then(|ch| face.glyph_index(ch))
                        .unwrap_or(0)
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(TextComplexity {
            is_simple,
            mapped_length: length as u32,
            glyph_indices,
        })
    }

    fn analyze_script(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        self.unicode.analyze_script(source, offset, length, sink)
    }

    fn analyze_bidi(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        self.unicode.analyze_bidi(source, offset, length, sink)
    }

    fn get_glyphs(
        &self,
        text: &[u16],
        face: &dyn FontFace,
        is_right_to_left: bool,
        script: ScriptAnalysis,
        locale: &str,
        max_glyph_count: usize,
    ) -> Result<ShapedGlyphs> {
        let key = RunKey {
            face: face.id(),
            text: text.to_vec(),
            is_right_to_left,
            script: script.script,
            locale: locale.to_string(),
        };

        let stashed = {
            let mut overflowed = self.overflowed.lock();
            match overflowed.take() {
                Some((stashed_key, shaped)) if stashed_key == key => Some(shaped),
                other => {
                    *overflowed = other;
                    None
                },
            }
        };
        let shaped = match stashed {
            Some(shaped) => shaped,
            None => self.shape_run(text, face, is_right_to_left, script, locale)?,
        };

        if shaped.glyph_count() > max_glyph_count {
            *self.overflowed.lock() = Some((key, shaped));
            return Err(GlyphMapError::InsufficientBuffer {
                capacity: max_glyph_count,
            });
        }
        Ok(shaped)
    }

    fn get_glyph_placements(
        &self,
        _text: &[u16],
        shaped: &ShapedGlyphs,
        face: &dyn FontFace,
        font_size: f32,
        _is_right_to_left: bool,
        _script: ScriptAnalysis,
        _locale: &str,
    ) -> Result<GlyphPlacements> {
        if shaped.glyph_props.len() != shaped.glyph_count() {
            return Err(GlyphMapError::platform(format!(
                "{} glyph properties for {} glyphs",
                shaped.glyph_props.len(),
                shaped.glyph_count()
            )));
        }

        let scale = font_size / face.metrics().design_units_per_em.max(1) as f32;
        let advances = shaped
            .glyph_props
            .iter()
            .map(|props| props.design_advance as f32 * scale)
            .collect();
        let offsets = shaped
            .glyph_props
            .iter()
            .map(|props| GlyphOffset {
                advance_offset: props.design_offset.0 as f32 * scale,
                ascender_offset: props.design_offset.1 as f32 * scale,
            })
            .collect();

        Ok(GlyphPlacements { advances, offsets })
    }
}
