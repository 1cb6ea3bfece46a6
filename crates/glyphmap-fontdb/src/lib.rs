//! Where faces come from: font files and the system font fallback
//!
//! [`FontFile`] wraps one face of a font file and answers the questions the
//! pipeline asks of a face (cmap, advances, metrics, default GSUB features).
//! [`SystemFontFallback`] picks faces for runs of text out of a `fontdb`
//! database, preferring the requested family.

pub mod face;
pub mod fallback;

pub use face::FontFile;
pub use fallback::{is_default_ignorable, SystemFontFallback, DEFAULT_COVERAGE_CACHE_SIZE};
