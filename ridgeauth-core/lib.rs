mod level;

pub use level::{AuthLevel, InvalidLevel, LevelThresholds, ThresholdTable};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point = corner location (subpixel) + orientation in radians
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// An ordered, non-empty collection of descriptors extracted from one image.
///
/// Non-emptiness is enforced at construction: extraction that yields no
/// keypoints produces no `DescriptorSet` at all, so "no features found" can
/// never masquerade as a valid zero-length set downstream.
#[derive(Debug, Clone)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Build a set from parallel keypoint/descriptor vectors.
    ///
    /// Returns `None` when the vectors are empty or their lengths disagree.
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> Option<Self> {
        if descriptors.is_empty() || keypoints.len() != descriptors.len() {
            return None;
        }
        Some(Self { keypoints, descriptors })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        // Always false by construction; kept so clippy's len-without-is-empty
        // lint and callers iterating generically stay happy.
        self.descriptors.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }
}

/// Tunable parameters of the keypoint/descriptor pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Contrast threshold of the segment test.
    pub fast_threshold: u8,
    /// Side of the (odd) patch used for orientation estimation.
    pub patch_size: usize,
    pub n_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            patch_size: 15,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
