use crate::pattern::SamplingPattern;
use rayon::prelude::*;
use ridgeauth_core::{Descriptor, Image, Keypoint};

/// Computes rotated binary descriptors around keypoints by comparing pairs
/// of bilinearly sampled intensities.
pub struct DescriptorGenerator {
    w: usize,
    h: usize,
    pattern: SamplingPattern,
}

impl DescriptorGenerator {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0);
        Self {
            w: width,
            h: height,
            pattern: SamplingPattern::new(),
        }
    }

    pub fn generate(&self, img: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d: Descriptor = [0u8; 32];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pattern.pairs().iter().enumerate() {
                    // Rotate each comparison point by the keypoint angle so
                    // the descriptor is orientation invariant.
                    let (rx1, ry1) = (
                        cx + c * dx1 as f32 - s * dy1 as f32,
                        cy + s * dx1 as f32 + c * dy1 as f32,
                    );
                    let (rx2, ry2) = (
                        cx + c * dx2 as f32 - s * dy2 as f32,
                        cy + s * dx2 as f32 + c * dy2 as f32,
                    );

                    let val1 = self.bilinear_sample(img, rx1, ry1);
                    let val2 = self.bilinear_sample(img, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }

    /// Bilinear interpolation with clamping at the image boundary.
    fn bilinear_sample(&self, img: &Image, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;

        if x0 < 0.0 || y0 < 0.0 || x1 >= self.w as f32 || y1 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img[cy * self.w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;

        let x0_idx = x0 as usize;
        let y0_idx = y0 as usize;
        let x1_idx = (x1 as usize).min(self.w - 1);
        let y1_idx = (y1 as usize).min(self.h - 1);

        let p00 = img[y0_idx * self.w + x0_idx] as f32;
        let p10 = img[y0_idx * self.w + x1_idx] as f32;
        let p01 = img[y1_idx * self.w + x0_idx] as f32;
        let p11 = img[y1_idx * self.w + x1_idx] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: usize, height: usize) -> Image {
        (0..width * height)
            .map(|i| ((i % width) * 255 / width.max(1)) as u8)
            .collect()
    }

    fn center_keypoint(width: usize, height: usize, angle: f32) -> Keypoint {
        Keypoint {
            x: width as f32 / 2.0,
            y: height as f32 / 2.0,
            angle,
        }
    }

    #[test]
    fn descriptors_are_deterministic() {
        let generator = DescriptorGenerator::new(64, 64);
        let img = gradient_image(64, 64);
        let kps = vec![center_keypoint(64, 64, 0.3)];
        assert_eq!(generator.generate(&img, &kps), generator.generate(&img, &kps));
    }

    #[test]
    fn one_descriptor_per_keypoint() {
        let generator = DescriptorGenerator::new(64, 64);
        let img = gradient_image(64, 64);
        let kps = vec![
            center_keypoint(64, 64, 0.0),
            Keypoint { x: 20.0, y: 20.0, angle: 1.0 },
            Keypoint { x: 40.0, y: 40.0, angle: -1.0 },
        ];
        assert_eq!(generator.generate(&img, &kps).len(), 3);
    }

    #[test]
    fn uniform_patch_yields_zero_descriptor() {
        // All comparisons see equal intensities, so no bit is set.
        let generator = DescriptorGenerator::new(64, 64);
        let img = vec![100u8; 64 * 64];
        let descs = generator.generate(&img, &[center_keypoint(64, 64, 0.0)]);
        assert_eq!(descs[0], [0u8; 32]);
    }

    #[test]
    fn distinct_locations_yield_distinct_descriptors() {
        let generator = DescriptorGenerator::new(64, 64);
        let mut img = gradient_image(64, 64);
        // Break symmetry with a bright block near one keypoint.
        for y in 16..24 {
            for x in 16..24 {
                img[y * 64 + x] = 255;
            }
        }
        let descs = generator.generate(
            &img,
            &[
                Keypoint { x: 20.0, y: 20.0, angle: 0.0 },
                Keypoint { x: 44.0, y: 44.0, angle: 0.0 },
            ],
        );
        assert_ne!(descs[0], descs[1]);
    }

    #[test]
    fn boundary_keypoints_do_not_panic() {
        let generator = DescriptorGenerator::new(32, 32);
        let img = gradient_image(32, 32);
        let descs = generator.generate(
            &img,
            &[
                Keypoint { x: 0.0, y: 0.0, angle: 0.7 },
                Keypoint { x: 31.0, y: 31.0, angle: -2.0 },
            ],
        );
        assert_eq!(descs.len(), 2);
    }
}
