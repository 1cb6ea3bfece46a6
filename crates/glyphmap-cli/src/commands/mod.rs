//! Subcommand implementations

pub mod info;
pub mod map;

use anyhow::Result;
use glyphmap::MapperBuilder;

use crate::cli::FontArgs;

/// A builder carrying the font sources named on the command line
pub(crate) fn builder_for(fonts: &FontArgs) -> MapperBuilder {
    let mut builder = MapperBuilder::new().system_fonts(!fonts.no_system_fonts);
    for path in &fonts.font_files {
        builder = builder.font_file(path);
    }
    for family in &fonts.fallback_families {
        builder = builder.fallback_family(family);
    }
    builder
}

/// Turns a `&str` into UTF-16 code units, the unit every offset is counted in
pub(crate) fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

pub(crate) fn read_text_file(path: &std::path::Path) -> Result<String> {
    use anyhow::Context;
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
