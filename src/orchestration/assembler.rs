// Result assembler: overlay synthesis plus final record construction
//
// For each surviving bubble and each of its sub-regions, synthesizes the
// overlay and builds the final record in one step. No partially-built
// structure is mutated after the fact.

use image::DynamicImage;
use tracing::{instrument, warn};

use crate::core::types::{BubbleEntry, BubbleResult, TextPatch};
use crate::services::overlay::OverlaySynthesizer;

pub struct ResultAssembler {
    synthesizer: OverlaySynthesizer,
}

impl ResultAssembler {
    pub fn new(synthesizer: OverlaySynthesizer) -> Self {
        Self { synthesizer }
    }

    /// Attach a synthesized overlay to every sub-region.
    ///
    /// Border sampling runs against the original uncropped image. A failed
    /// synthesis skips that sub-region only; a bubble left with no patches is
    /// dropped entirely.
    #[instrument(skip(self, image, entries), fields(bubbles = entries.len()))]
    pub async fn assemble(
        &self,
        image: &DynamicImage,
        entries: Vec<BubbleEntry>,
    ) -> Vec<BubbleResult> {
        let rgba = image.to_rgba8();
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut patches = Vec::with_capacity(entry.subregions.len());

            for (subregion_index, sub) in entry.subregions.into_iter().enumerate() {
                match self
                    .synthesizer
                    .synthesize(&rgba, sub.region, entry.index, subregion_index)
                    .await
                {
                    Ok(patch) => patches.push(TextPatch {
                        region: sub.region,
                        text: sub.text,
                        locale: sub.locale,
                        overlay_filename: patch.filename,
                    }),
                    Err(err) => warn!(
                        bubble = entry.index,
                        subregion = subregion_index,
                        error = %err,
                        "Overlay synthesis failed, skipping subregion"
                    ),
                }
            }

            if !patches.is_empty() {
                results.push(BubbleResult {
                    index: entry.index,
                    patches,
                });
            }
        }

        results
    }
}
