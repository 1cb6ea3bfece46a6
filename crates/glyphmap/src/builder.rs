//! Wiring the system services into a mapper

use std::path::PathBuf;
use std::sync::Arc;

use glyphmap_core::{GlyphMapper, MapperConfig, Result};
use glyphmap_fontdb::SystemFontFallback;
use glyphmap_shape_hr::HarfrustAnalyzer;

/// A mapper over installed fonts with harfrust shaping
///
/// Configuration comes from the `GLYPHMAP_*` environment variables.
pub fn system_mapper() -> GlyphMapper {
    let fallback = SystemFontFallback::system();
    GlyphMapper::new(Arc::new(fallback), Arc::new(HarfrustAnalyzer::new()))
        .with_config(MapperConfig::from_env())
}

/// Builds a [`GlyphMapper`] with a chosen set of fonts
///
/// ```ignore
/// let mapper = MapperBuilder::new()
///     .system_fonts(false)
///     .font_file("fonts/FiraCode-Regular.ttf")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct MapperBuilder {
    system_fonts: bool,
    font_files: Vec<PathBuf>,
    fallback_families: Vec<String>,
    config: MapperConfig,
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self {
            system_fonts: true,
            font_files: Vec::new(),
            fallback_families: Vec::new(),
            config: MapperConfig::from_env(),
        }
    }
}

impl MapperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether installed fonts join the fallback order (default: yes)
    pub fn system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }

    /// Loads an extra font file; its faces are tried after the system fonts
    pub fn font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    /// Families tried before database order when the base family lacks a character
    pub fn fallback_family(mut self, family: impl Into<String>) -> Self {
        self.fallback_families.push(family.into());
        self
    }

    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// The fallback service alone, for callers that only need font selection
    pub fn build_fallback(&self) -> Result<SystemFontFallback> {
        let mut fallback = if self.system_fonts {
            SystemFontFallback::system()
        } else {
            SystemFontFallback::new(Default::default())
        };
        for path in &self.font_files {
            fallback.load_font_file(path)?;
            log::debug!("Loaded font file {}", path.display());
        }
        Ok(fallback.with_fallback_families(self.fallback_families.clone()))
    }

    pub fn build(self) -> Result<GlyphMapper> {
        let fallback = self.build_fallback()?;
        Ok(
            GlyphMapper::new(Arc::new(fallback), Arc::new(HarfrustAnalyzer::new()))
                .with_config(self.config),
        )
    }
}
