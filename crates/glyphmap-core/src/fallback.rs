//! The font-fallback walk
//!
//! Asks the fallback service for one run at a time until the whole string is
//! covered, merging neighbouring runs that landed on the same face. The
//! number of mappings is bounded by the number of face changes, not by the
//! number of queries the service needed.

use crate::{
    analysis::TextAnalysisSource,
    error::{GlyphMapError, Result},
    traits::FontFallback,
    types::FallbackMapping,
};

/// Walks a logical string through a [`FontFallback`] service
pub struct FallbackWalker<'a> {
    fallback: &'a dyn FontFallback,
    source: TextAnalysisSource<'a>,
    base_family: Option<&'a str>,
}

impl<'a> FallbackWalker<'a> {
    /// An empty `base_family` means the system default
    pub fn new(
        fallback: &'a dyn FontFallback,
        source: TextAnalysisSource<'a>,
        base_family: Option<&'a str>,
    ) -> Self {
        let base_family = base_family.filter(|family| !family.trim().is_empty());
        Self {
            fallback,
            source,
            base_family,
        }
    }

    /// Resolves every code unit of the source to a face (or to no face)
    ///
    /// The returned mappings tile the string in order.
    pub fn walk(&self) -> Result<Vec<FallbackMapping>> {
        let text_length = self.source.len();
        let mut mappings: Vec<FallbackMapping> = Vec::new();
        let mut offset = 0u32;

        while offset < text_length {
            let remaining = text_length - offset;
            let run =
                self.fallback
                    .map_characters(&self.source, offset, remaining, self.base_family)?;

            if run.mapped_length == 0 {
                return Err(GlyphMapError::platform(format!(
                    "font fallback mapped zero characters at offset {offset}"
                )));
            }
            let mapped_length = run.mapped_length.min(remaining);

            let face_id = run.face.as_ref().map(|face| face.id());
            match mappings.last_mut() {
                Some(last) if last.face_id() == face_id => {
                    last.text_length += mapped_length;
                },
                _ => {
                    log::trace!(
                        "Fallback run {}..{} -> {}",
                        offset,
                        offset + mapped_length,
                        run.face
                            .as_ref()
                            .map(|face| face.family_name().to_string())
                            .unwrap_or_else(|| "<none>".to_string())
                    );
                    mappings.push(FallbackMapping {
                        face: run.face,
                        text_start: offset,
                        text_length: mapped_length,
                    });
                },
            }

            offset += mapped_length;
        }

        Ok(mappings)
    }
}
