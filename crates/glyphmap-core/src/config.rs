//! Mapper configuration
//!
//! Defaults suit most callers. [`MapperConfig::from_env`] lets a deployment
//! tune the mapper without code changes:
//!
//! ```bash
//! GLYPHMAP_MAX_RETRIES=10 GLYPHMAP_MISSING_GLYPHS=notdef ./my_app
//! ```
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `GLYPHMAP_MAX_RETRIES` | unsigned integer | `8` |
//! | `GLYPHMAP_MISSING_GLYPHS` | `report`, `notdef`, `fail` | `report` |
//! | `GLYPHMAP_SIMPLE_PATH` | `0`/`false`/`off` disables | enabled |

use std::fmt;
use std::str::FromStr;

use crate::error::GlyphMapError;

/// Doublings of the glyph buffer allowed after the first estimate
pub const DEFAULT_MAX_GLYPH_RETRIES: u32 = 8;

pub const ENV_MAX_RETRIES: &str = "GLYPHMAP_MAX_RETRIES";
pub const ENV_MISSING_GLYPHS: &str = "GLYPHMAP_MISSING_GLYPHS";
pub const ENV_SIMPLE_PATH: &str = "GLYPHMAP_SIMPLE_PATH";

/// What happens to characters no installed face covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingGlyphPolicy {
    /// Record a [`crate::CoverageGap`] in the result
    #[default]
    Report,
    /// Draw `.notdef` from the last-resort face, one glyph per character
    Notdef,
    /// Abort the mapping with [`GlyphMapError::NoFontAvailable`]
    Fail,
}

impl FromStr for MissingGlyphPolicy {
    type Err = GlyphMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "gap" => Ok(Self::Report),
            "notdef" | "tofu" => Ok(Self::Notdef),
            "fail" | "error" => Ok(Self::Fail),
            other => Err(GlyphMapError::Config(format!(
                "unknown missing-glyph policy '{other}' (expected report, notdef or fail)"
            ))),
        }
    }
}

impl fmt::Display for MissingGlyphPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Report => "report",
            Self::Notdef => "notdef",
            Self::Fail => "fail",
        })
    }
}

/// How the mapper behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Retries after the first glyph-buffer estimate, each doubling it
    pub max_glyph_retries: u32,
    pub missing_glyphs: MissingGlyphPolicy,
    /// Take the nominal-glyph fast path for simple text
    pub simple_path: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_glyph_retries: DEFAULT_MAX_GLYPH_RETRIES,
            missing_glyphs: MissingGlyphPolicy::default(),
            simple_path: true,
        }
    }
}

impl MapperConfig {
    /// Defaults overridden by `GLYPHMAP_*` environment variables
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MapperConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            match value.trim().parse::<u32>() {
                Ok(retries) => config.max_glyph_retries = retries,
                Err(_) => log::warn!("Ignoring {ENV_MAX_RETRIES}={value}: not an unsigned integer"),
            }
        }

        if let Some(value) = lookup(ENV_MISSING_GLYPHS) {
            match value.parse::<MissingGlyphPolicy>() {
                Ok(policy) => config.missing_glyphs = policy,
                Err(e) => log::warn!("Ignoring {ENV_MISSING_GLYPHS}: {e}"),
            }
        }

        if let Some(value) = lookup(ENV_SIMPLE_PATH) {
            config.simple_path = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        config
    }

    pub fn with_max_glyph_retries(mut self, retries: u32) -> Self {
        self.max_glyph_retries = retries;
        self
    }

    pub fn with_missing_glyphs(mut self, policy: MissingGlyphPolicy) -> Self {
        self.missing_glyphs = policy;
        self
    }

    pub fn with_simple_path(mut self, enabled: bool) -> Self {
        self.simple_path = enabled;
        self
    }
}
