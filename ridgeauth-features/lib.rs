mod corner;
mod describe;
mod error;
mod pattern;

pub use corner::{CornerDetector, ScoredKeypoint};
pub use describe::DescriptorGenerator;
pub use error::{FeatureError, FeatureResult};
pub use pattern::{PATCH_RADIUS, PATTERN_BITS, SamplingPattern};

use log::debug;
use ridgeauth_core::{DescriptorSet, Image, PipelineConfig};

/// Scale/rotation-tolerant keypoint detection plus binary description,
/// combined behind one call. Bound to one image geometry.
pub struct FeatureExtractor {
    detector: CornerDetector,
    generator: DescriptorGenerator,
}

impl FeatureExtractor {
    pub fn new(cfg: PipelineConfig, width: usize, height: usize) -> FeatureResult<Self> {
        let detector = CornerDetector::new(cfg, width, height)?;
        let generator = DescriptorGenerator::new(width, height);
        Ok(Self { detector, generator })
    }

    /// Extract a descriptor set from a preprocessed mask.
    ///
    /// `Ok(None)` means the detector found nothing salient. Callers treat
    /// that as an extraction failure, distinct from a valid set and from a
    /// contract error. A returned set is never empty.
    pub fn extract(&self, img: &Image) -> FeatureResult<Option<DescriptorSet>> {
        let keypoints = self.detector.detect(img)?;
        if keypoints.is_empty() {
            debug!("extract: no keypoints detected");
            return Ok(None);
        }

        let descriptors = self.generator.generate(img, &keypoints);
        debug!("extract: {} keypoints described", keypoints.len());
        Ok(DescriptorSet::new(keypoints, descriptors))
    }

    pub fn config(&self) -> &PipelineConfig {
        self.detector.config()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.detector.dimensions()
    }
}
