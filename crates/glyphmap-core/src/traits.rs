//! The contracts that stand in for the platform text services
//!
//! Three traits, one per service the pipeline talks to. Backends implement
//! them; the mapper only ever sees the traits, so a platform shaping engine
//! and a pure Rust one plug in the same way.
//!
//! ## The Players
//!
//! - [`FontFace`] - One concrete face: metrics, cmap, design advances
//! - [`FontFallback`] - Which face draws the text at a given offset
//! - [`TextAnalyzer`] - Complexity, script and bidi analysis, glyph shaping
//!
//! All three are `Send + Sync`. The mapper holds no mutable state of its own,
//! so whether a mapper can be shared across threads depends entirely on
//! whether the backends behind these traits are safe to call concurrently.
//! Implementations must state that explicitly.

use std::sync::Arc;

use crate::{
    analysis::{AnalysisSink, TextAnalysisSource},
    error::Result,
    types::*,
};

/// A concrete font face the pipeline can shape with
///
/// ```ignore
/// struct MyFace { data: Vec<u8> }
///
/// impl FontFace for MyFace {
///     fn id(&self) -> FaceId { FaceId(7) }
///     fn family_name(&self) -> &str { "My Sans" }
///     fn data(&self) -> &[u8] { &self.data }
///     fn metrics(&self) -> FontMetrics { FontMetrics::default() }
///     fn glyph_index(&self, ch: char) -> Option<GlyphId> { Some(3) }
///     fn design_glyph_advance(&self, glyph: GlyphId) -> Option<i32> { Some(500) }
/// }
/// ```
pub trait FontFace: Send + Sync {
    /// Identity used to coalesce runs that resolve to the same face
    fn id(&self) -> FaceId;

    /// Family name, for logs and diagnostics
    fn family_name(&self) -> &str;

    /// Raw font bytes; may be empty for synthetic faces
    fn data(&self) -> &[u8];

    /// Face index inside a collection file
    fn face_index(&self) -> u32 {
        0
    }

    /// Font-wide design metrics
    fn metrics(&self) -> FontMetrics;

    /// Nominal glyph for a character, `None` when the face lacks it
    fn glyph_index(&self, ch: char) -> Option<GlyphId>;

    /// Advance of one glyph in design units
    fn design_glyph_advance(&self, glyph: GlyphId) -> Option<i32>;

    /// Advances in design units for a batch of glyphs
    ///
    /// Glyphs without metrics get an advance of 0.
    fn design_glyph_advances(&self, glyphs: &[GlyphId]) -> Result<Vec<i32>> {
        Ok(glyphs
            .iter()
            .map(|&glyph| self.design_glyph_advance(glyph).unwrap_or(0))
            .collect())
    }

    /// Whether the face applies ligatures or contextual forms by default
    ///
    /// Such faces never take the simple path: a nominal cmap lookup would
    /// skip substitutions the designer intended.
    fn has_default_substitutions(&self) -> bool {
        false
    }

    /// Whether every scalar in `chars` has a glyph
    fn covers(&self, chars: &[char]) -> bool {
        chars.iter().all(|&ch| self.glyph_index(ch).is_some())
    }
}

/// Resolves runs of text to faces
pub trait FontFallback: Send + Sync {
    /// Finds the face for the text starting at `offset`
    ///
    /// At most `length` code units are considered. `base_family` names the
    /// preferred family; `None` or an empty name means the system default.
    /// The returned `mapped_length` must be at least 1 for a non-empty range.
    fn map_characters(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        base_family: Option<&str>,
    ) -> Result<FallbackRun>;

    /// A face that may stand in for text nothing else covers
    fn last_resort_face(&self, _base_family: Option<&str>) -> Option<Arc<dyn FontFace>> {
        None
    }
}

/// Where text learns its script, direction and glyphs
pub trait TextAnalyzer: Send + Sync {
    /// Identify yourself in logs and error messages
    fn name(&self) -> &'static str;

    /// Classifies the longest prefix of `text` with uniform simplicity
    fn text_complexity(&self, text: &[u16], face: &dyn FontFace) -> Result<TextComplexity>;

    /// Reports script runs for `[offset, offset + length)` into the sink
    fn analyze_script(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()>;

    /// Reports bidi levels for `[offset, offset + length)` into the sink
    fn analyze_bidi(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()>;

    /// Maps characters to glyphs
    ///
    /// Fails with [`crate::GlyphMapError::InsufficientBuffer`] when the run
    /// needs more than `max_glyph_count` glyphs.
    #[allow(clippy::too_many_arguments)]
    fn get_glyphs(
        &self,
        text: &[u16],
        face: &dyn FontFace,
        is_right_to_left: bool,
        script: ScriptAnalysis,
        locale: &str,
        max_glyph_count: usize,
    ) -> Result<ShapedGlyphs>;

    /// Positions glyphs produced by [`TextAnalyzer::get_glyphs`] at `font_size`
    #[allow(clippy::too_many_arguments)]
    fn get_glyph_placements(
        &self,
        text: &[u16],
        shaped: &ShapedGlyphs,
        face: &dyn FontFace,
        font_size: f32,
        is_right_to_left: bool,
        script: ScriptAnalysis,
        locale: &str,
    ) -> Result<GlyphPlacements>;
}
