//! Glyphmap Core: from a logical string to shaped glyph segments
//!
//! Text enters as UTF-16 code units, exits as runs of positioned glyphs that a
//! renderer can draw without shaping anything itself. This crate holds the
//! pipeline that makes that transformation possible.
//!
//! ## The Pipeline
//!
//! Every string follows the same journey:
//!
//! 1. **Font fallback** - The next run of characters resolves to one concrete face
//! 2. **Complexity** - Each run splits into simple and complex prefixes
//! 3. **Analysis** - Complex prefixes get script and bidi levels
//! 4. **Shaping** - Characters become glyph indices, then advances and offsets
//! 5. **Assembly** - Glyph arrays merge into segments keyed by (face, bidi level)
//!
//! ## Map Your First String
//!
//! ```rust,ignore
//! use glyphmap_core::GlyphMapper;
//! use std::sync::Arc;
//!
//! let mapper = GlyphMapper::new(Arc::new(my_fallback), Arc::new(my_analyzer));
//! let result = mapper.map_str("en-US", "Segoe UI", 16.0, "Hello->world")?;
//! for segment in &result {
//!     println!("{} glyphs at level {}", segment.glyph_count(), segment.bidi_level);
//! }
//! ```
//!
//! ## The Traits That Power Everything
//!
//! The platform text services sit behind three traits in [`traits`]:
//!
//! - [`FontFace`] - Design metrics, nominal glyph lookup, raw font bytes
//! - [`FontFallback`] - Resolves the next run of text to a face
//! - [`TextAnalyzer`] - Complexity, script, bidi, glyph shaping and placement
//!
//! Results flow through the types in [`types`].

pub mod analysis;
pub mod assembler;
pub mod config;
pub mod error;
pub mod fallback;
pub mod glyph_run;
pub mod mapper;
pub mod traits;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisCollector, AnalysisSink, TextAnalysisSource};
pub use config::{MapperConfig, MissingGlyphPolicy};
pub use error::{FontError, GlyphMapError, Result};
pub use glyph_run::{BaselineLayout, GlyphRun, PlacedGlyph, PlacedRun};
pub use mapper::GlyphMapper;
pub use traits::{FontFace, FontFallback, TextAnalyzer};
pub use types::*;

/// The data structures that carry results through the pipeline
pub mod types {
    use std::fmt;
    use std::sync::Arc;

    use crate::traits::FontFace;

    /// Glyph index within one face
    pub type GlyphId = u16;

    /// Stable identity of a loaded face
    ///
    /// Two mappings refer to the same face exactly when their ids match.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct FaceId(pub u64);

    impl fmt::Display for FaceId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "face#{}", self.0)
        }
    }

    /// Which way a paragraph reads
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ReadingDirection {
        #[default]
        LeftToRight,
        RightToLeft,
    }

    impl ReadingDirection {
        /// The embedding level of the paragraph itself
        pub fn base_level(self) -> u8 {
            match self {
                ReadingDirection::LeftToRight => 0,
                ReadingDirection::RightToLeft => 1,
            }
        }
    }

    /// Font-wide design metrics
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct FontMetrics {
        pub design_units_per_em: u16,
        pub ascent: i16,
        pub descent: i16,
        pub line_gap: i16,
    }

    impl Default for FontMetrics {
        fn default() -> Self {
            Self {
                design_units_per_em: 1000,
                ascent: 800,
                descent: 200,
                line_gap: 0,
            }
        }
    }

    /// Four-letter ISO 15924 script code such as `Latn` or `Arab`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScriptTag(pub [u8; 4]);

    impl ScriptTag {
        pub const COMMON: ScriptTag = ScriptTag(*b"Zyyy");
        pub const INHERITED: ScriptTag = ScriptTag(*b"Zinh");
        pub const UNKNOWN: ScriptTag = ScriptTag(*b"Zzzz");
        pub const LATIN: ScriptTag = ScriptTag(*b"Latn");

        pub const fn new(tag: &[u8; 4]) -> Self {
            Self(*tag)
        }

        pub fn as_str(&self) -> &str {
            std::str::from_utf8(&self.0).unwrap_or("Zzzz")
        }

        /// Common, inherited and unknown never start a script run of their own
        pub fn is_significant(&self) -> bool {
            !matches!(*self, Self::COMMON | Self::INHERITED | Self::UNKNOWN)
        }
    }

    impl fmt::Display for ScriptTag {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Whether a script run produces visible glyphs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ScriptShapes {
        #[default]
        Default,
        /// Control characters and friends: shape, but nothing shows
        NoVisual,
    }

    /// Script classification handed from analysis to shaping
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScriptAnalysis {
        pub script: ScriptTag,
        pub shapes: ScriptShapes,
    }

    impl Default for ScriptAnalysis {
        fn default() -> Self {
            Self {
                script: ScriptTag::COMMON,
                shapes: ScriptShapes::Default,
            }
        }
    }

    /// One run of text sharing a script
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScriptRun {
        pub text_start: u32,
        pub text_length: u32,
        pub analysis: ScriptAnalysis,
    }

    /// One run of text sharing an embedding level
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BidiRun {
        pub text_start: u32,
        pub text_length: u32,
        pub explicit_level: u8,
        pub resolved_level: u8,
    }

    /// A run homogeneous in both script and resolved bidi level
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnalysisRun {
        pub text_start: u32,
        pub text_length: u32,
        pub script: ScriptAnalysis,
        pub bidi_level: u8,
    }

    impl AnalysisRun {
        pub fn is_right_to_left(&self) -> bool {
            self.bidi_level % 2 == 1
        }
    }

    /// Displacement of a glyph from its nominal pen position
    ///
    /// `advance_offset` points along the reading direction, `ascender_offset`
    /// points up.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GlyphOffset {
        pub advance_offset: f32,
        pub ascender_offset: f32,
    }

    /// One face covering one run of the logical string
    #[derive(Clone)]
    pub struct FallbackMapping {
        /// `None` when no installed face covers the run
        pub face: Option<Arc<dyn FontFace>>,
        pub text_start: u32,
        pub text_length: u32,
    }

    impl FallbackMapping {
        pub fn face_id(&self) -> Option<FaceId> {
            self.face.as_ref().map(|face| face.id())
        }

        pub fn text_end(&self) -> u32 {
            self.text_start + self.text_length
        }
    }

    impl fmt::Debug for FallbackMapping {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FallbackMapping")
                .field("face", &self.face_id())
                .field("text_start", &self.text_start)
                .field("text_length", &self.text_length)
                .finish()
        }
    }

    /// What the fallback service answers for one query
    #[derive(Clone)]
    pub struct FallbackRun {
        pub face: Option<Arc<dyn FontFace>>,
        pub mapped_length: u32,
        /// Size correction suggested by the service (1.0 when unused)
        pub scale: f32,
    }

    /// Result of classifying the start of a run
    #[derive(Debug, Clone, PartialEq)]
    pub struct TextComplexity {
        pub is_simple: bool,
        /// Length of the uniformly simple (or complex) prefix; never 0 for non-empty input
        pub mapped_length: u32,
        /// Nominal glyphs for a simple prefix, one per code unit
        pub glyph_indices: Vec<GlyphId>,
    }

    /// Per-character output of glyph shaping
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShapingTextProperties {
        pub is_shaped_alone: bool,
        pub can_break_shaping_after: bool,
    }

    /// Per-glyph output of glyph shaping
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct ShapingGlyphProperties {
        pub is_cluster_start: bool,
        pub is_diacritic: bool,
        pub is_zero_width_space: bool,
        /// Advance in design units as chosen by the shaper
        pub design_advance: i32,
        /// Offset in design units, x along the reading direction, y up
        pub design_offset: (i32, i32),
    }

    /// Phase one of complex shaping: logical characters to glyphs
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct ShapedGlyphs {
        /// For each code unit, the index of the first glyph of its cluster
        pub cluster_map: Vec<u16>,
        pub text_props: Vec<ShapingTextProperties>,
        pub glyph_indices: Vec<GlyphId>,
        pub glyph_props: Vec<ShapingGlyphProperties>,
    }

    impl ShapedGlyphs {
        pub fn glyph_count(&self) -> usize {
            self.glyph_indices.len()
        }
    }

    /// Phase two of complex shaping: glyphs to positions
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct GlyphPlacements {
        pub advances: Vec<f32>,
        pub offsets: Vec<GlyphOffset>,
    }

    /// Temporary glyph data produced for one simple or complex run
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct GlyphArray {
        pub indices: Vec<GlyphId>,
        pub advances: Vec<f32>,
        pub offsets: Vec<GlyphOffset>,
    }

    impl GlyphArray {
        pub fn len(&self) -> usize {
            self.indices.len()
        }

        pub fn is_empty(&self) -> bool {
            self.indices.is_empty()
        }
    }

    /// The unit of rendering: one face, one size, one bidi level
    ///
    /// Glyphs are stored in logical order. A consumer drawing a right-to-left
    /// segment (odd `bidi_level`) must move the baseline by
    /// [`Segment::total_advance`] before drawing its first glyph, so the
    /// segment's visual origin is its right edge. [`crate::BaselineLayout`]
    /// implements that rule.
    #[derive(Clone)]
    pub struct Segment {
        pub face: Arc<dyn FontFace>,
        pub font_size: f32,
        pub bidi_level: u8,
        pub text_start: u32,
        pub text_length: u32,
        pub indices: Vec<GlyphId>,
        pub advances: Vec<f32>,
        pub offsets: Vec<GlyphOffset>,
    }

    impl Segment {
        pub fn glyph_count(&self) -> usize {
            self.indices.len()
        }

        pub fn face_id(&self) -> FaceId {
            self.face.id()
        }

        pub fn is_right_to_left(&self) -> bool {
            self.bidi_level % 2 == 1
        }

        pub fn total_advance(&self) -> f32 {
            self.advances.iter().sum()
        }

        pub fn text_end(&self) -> u32 {
            self.text_start + self.text_length
        }
    }

    impl fmt::Debug for Segment {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Segment")
                .field("face", &self.face_id())
                .field("font_size", &self.font_size)
                .field("bidi_level", &self.bidi_level)
                .field("text_start", &self.text_start)
                .field("text_length", &self.text_length)
                .field("indices", &self.indices)
                .field("advances", &self.advances)
                .finish()
        }
    }

    /// Characters no installed face could render
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CoverageGap {
        pub text_start: u32,
        pub text_length: u32,
    }

    /// Everything one mapping call produced, in logical order
    #[derive(Debug, Clone, Default)]
    pub struct MappingResult {
        pub segments: Vec<Segment>,
        pub gaps: Vec<CoverageGap>,
    }

    impl MappingResult {
        pub fn is_empty(&self) -> bool {
            self.segments.is_empty()
        }

        pub fn len(&self) -> usize {
            self.segments.len()
        }

        pub fn glyph_count(&self) -> usize {
            self.segments.iter().map(Segment::glyph_count).sum()
        }

        pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
            self.segments.iter()
        }

        pub fn into_segments(self) -> Vec<Segment> {
            self.segments
        }
    }

    impl<'a> IntoIterator for &'a MappingResult {
        type Item = &'a Segment;
        type IntoIter = std::slice::Iter<'a, Segment>;

        fn into_iter(self) -> Self::IntoIter {
            self.segments.iter()
        }
    }
}
