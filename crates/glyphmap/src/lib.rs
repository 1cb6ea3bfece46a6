//! glyphmap - from logical text to positioned glyph segments
//!
//! Give it a UTF-16 string, a locale, a preferred family and an em size;
//! get back segments of glyph indices, advances and offsets, one face and
//! one bidi level each, ready for a glyph-run draw call:
//!
//! 1. Font fallback picks a face for each run of characters
//! 2. Simple text takes a nominal-glyph fast path
//! 3. Complex text gets script and bidi analysis, then two-phase shaping
//! 4. Glyph arrays merge into segments
//!
//! # Example
//!
//! ```ignore
//! use glyphmap::{system_mapper, BaselineLayout};
//!
//! let mapper = system_mapper();
//! let result = mapper.map_str("en-US", "Segoe UI", 16.0, "Hello->world")?;
//! let runs = BaselineLayout::new(0.0, 20.0).layout_line(&result);
//! ```
//!
//! # Feature Flags
//!
//! - `system` (default): installed fonts via `fontdb`, shaping via `harfrust`
//! - `unicode`: re-export the script/bidi analysis crate

pub use glyphmap_core::{
    analysis, config, error, fallback, glyph_run, mapper, traits, types, BaselineLayout,
    CoverageGap, FaceId, GlyphMapError, GlyphMapper, GlyphRun, MapperConfig, MappingResult,
    MissingGlyphPolicy, PlacedGlyph, PlacedRun, ReadingDirection, Result, Segment,
};

#[cfg(feature = "unicode")]
pub use glyphmap_unicode as unicode;

#[cfg(feature = "system")]
pub use glyphmap_fontdb as fontdb;

#[cfg(feature = "system")]
pub use glyphmap_shape_hr as shape_hr;

#[cfg(feature = "system")]
mod builder;

#[cfg(feature = "system")]
pub use builder::{system_mapper, MapperBuilder};

/// Common imports for typical usage
pub mod prelude {
    pub use glyphmap_core::{
        error::{GlyphMapError, Result},
        traits::{FontFace, FontFallback, TextAnalyzer},
        types::{MappingResult, ReadingDirection, Segment},
        BaselineLayout, GlyphMapper, MapperConfig, MissingGlyphPolicy,
    };

    #[cfg(feature = "system")]
    pub use crate::builder::{system_mapper, MapperBuilder};
}
