use crate::error::{FeatureError, FeatureResult};
use rayon::prelude::*;
use ridgeauth_core::{Image, Keypoint, PipelineConfig};

/// Keypoint with corner response score for NMS
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}

/// Bresenham circle of radius 3 used by the segment test.
const RING: [(i32, i32); 16] = [
    (-3, 0), (-3, 1), (-2, 2), (-1, 3),
    (0, 3), (1, 3), (2, 2), (3, 1),
    (3, 0), (3, -1), (2, -2), (1, -3),
    (0, -3), (-1, -3), (-2, -2), (-3, -1),
];

/// Ring samples that must agree for a pixel to count as a corner.
const MIN_ARC: usize = 12;

/// FAST-style corner detector with intensity-centroid orientation and
/// non-maximum suppression. Bound to one image geometry at construction.
pub struct CornerDetector {
    cfg: PipelineConfig,
    w: usize,
    h: usize,
}

impl CornerDetector {
    pub fn new(cfg: PipelineConfig, width: usize, height: usize) -> FeatureResult<Self> {
        if width == 0 || height == 0 {
            return Err(FeatureError::InvalidImageSize { width, height });
        }

        // The segment test needs a 3-pixel border on each side.
        const MIN_SIZE: usize = 7;
        if width < MIN_SIZE || height < MIN_SIZE {
            return Err(FeatureError::ImageTooSmall { width, height, min_size: MIN_SIZE });
        }

        if cfg.fast_threshold == 0 || cfg.fast_threshold > 127 {
            return Err(FeatureError::InvalidThreshold(cfg.fast_threshold));
        }

        let min_dim = std::cmp::min(width, height);
        if cfg.patch_size % 2 == 0 || cfg.patch_size >= min_dim {
            return Err(FeatureError::InvalidPatchSize {
                patch_size: cfg.patch_size,
                min_image_dim: min_dim,
            });
        }

        Ok(Self { cfg, w: width, h: height })
    }

    fn validate_image(&self, img: &Image) -> FeatureResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FeatureError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect corners, suppress near-duplicates, and return oriented
    /// keypoints. An image with no salient structure yields an empty vector.
    pub fn detect(&self, img: &Image) -> FeatureResult<Vec<Keypoint>> {
        let scored = self.detect_with_response(img)?;
        let suppressed = self.non_maximum_suppression(&scored, 3.0);
        Ok(suppressed.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Run the segment test over the whole image, scoring each corner by the
    /// mean absolute contrast of its agreeing arc.
    pub fn detect_with_response(&self, img: &Image) -> FeatureResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let threshold = self.cfg.fast_threshold;
        let rows = 3..self.h.saturating_sub(3);
        let keypoints = rows
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut v = Vec::new();
                for x in 3..self.w - 3 {
                    let center = img[y * self.w + x];
                    let mut brighter = 0usize;
                    let mut darker = 0usize;
                    let mut brighter_sum = 0i32;
                    let mut darker_sum = 0i32;

                    // Overflowing bounds mean the test cannot be satisfied;
                    // saturating instead would turn contrast-free plateaus at
                    // the intensity extremes into dense fields of corners.
                    let bright_bound = center.checked_add(threshold);
                    for &(dx, dy) in &RING {
                        let xx = (x as i32 + dx).clamp(0, (self.w - 1) as i32) as usize;
                        let yy = (y as i32 + dy).clamp(0, (self.h - 1) as i32) as usize;
                        let q = img[yy * self.w + xx];

                        if bright_bound.is_some_and(|bound| q >= bound) {
                            brighter += 1;
                            brighter_sum += q as i32 - center as i32;
                        } else if q.checked_add(threshold).is_some_and(|bound| bound <= center) {
                            darker += 1;
                            darker_sum += center as i32 - q as i32;
                        }
                    }

                    if brighter >= MIN_ARC || darker >= MIN_ARC {
                        let angle = self.orientation(img, x, y);
                        let response = if brighter >= MIN_ARC {
                            brighter_sum as f32 / brighter as f32
                        } else {
                            darker_sum as f32 / darker as f32
                        };
                        v.push(ScoredKeypoint {
                            keypoint: Keypoint { x: x as f32, y: y as f32, angle },
                            response,
                        });
                    }
                }
                v
            })
            .collect();

        Ok(keypoints)
    }

    /// Greedy non-maximum suppression: strongest responses first, dropping
    /// any candidate closer than `min_distance` to an accepted keypoint.
    pub fn non_maximum_suppression(
        &self,
        keypoints: &[ScoredKeypoint],
        min_distance: f32,
    ) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }

        let mut sorted = keypoints.to_vec();
        sorted.sort_by(|a, b| {
            b.response
                .partial_cmp(&a.response)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let min_distance_sq = min_distance * min_distance;
        let mut accepted: Vec<ScoredKeypoint> = Vec::new();

        'candidates: for candidate in sorted {
            for kept in &accepted {
                let dx = candidate.keypoint.x - kept.keypoint.x;
                let dy = candidate.keypoint.y - kept.keypoint.y;
                if dx * dx + dy * dy < min_distance_sq {
                    continue 'candidates;
                }
            }
            accepted.push(candidate);
        }

        accepted
    }

    /// Orientation by intensity centroid over the configured patch. A patch
    /// that would leave the image falls back to a zero angle.
    fn orientation(&self, img: &Image, x: usize, y: usize) -> f32 {
        let half = (self.cfg.patch_size / 2) as i32;
        let (cx, cy) = (x as i32, y as i32);

        if cx - half < 0 || cy - half < 0 || cx + half >= self.w as i32 || cy + half >= self.h as i32 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for dy in -half..=half {
            let yy = (cy + dy) as usize;
            for dx in -half..=half {
                let xx = (cx + dx) as usize;
                let val = img[yy * self.w + xx] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        (m01 as f32).atan2(m10 as f32)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}
