mod error;

pub use error::{PrepError, PrepResult};

use log::debug;
use rayon::prelude::*;
use ridgeauth_core::Image;

/// Value assigned to foreground (ridge) pixels in the binary mask.
pub const FOREGROUND: u8 = 255;
/// Value assigned to background pixels in the binary mask.
pub const BACKGROUND: u8 = 0;

/// Global binarization threshold. Deliberately fixed rather than adaptive to
/// illumination.
const BINARIZE_THRESHOLD: u8 = 127;

/// Separable 5x5 Gaussian weights (sum 16), the standard small-kernel
/// approximation for a derived sigma.
const GAUSS_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

/// Turns a raw grayscale image into a binary segmentation mask isolating
/// foreground ridge structure.
///
/// The pipeline is smoothing -> inverted binarization -> enclosed-region
/// segmentation; each stage is pure and exposed individually so a host can
/// observe intermediates without the pipeline depending on it.
pub struct Preprocessor {
    w: usize,
    h: usize,
}

impl Preprocessor {
    pub fn new(width: usize, height: usize) -> PrepResult<Self> {
        if width == 0 || height == 0 {
            return Err(PrepError::InvalidImageSize { width, height });
        }
        Ok(Self { w: width, h: height })
    }

    fn validate_image(&self, img: &Image) -> PrepResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(PrepError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Run all three stages. The output has the input's dimensions and only
    /// two sample values; a fully background input degenerates to an
    /// all-background mask rather than erroring.
    pub fn preprocess(&self, img: &Image) -> PrepResult<Image> {
        self.validate_image(img)?;
        let smoothed = self.smooth(img);
        let binarized = self.binarize(&smoothed);
        let mask = self.segment(&binarized);

        let coverage = mask.iter().filter(|&&p| p == FOREGROUND).count();
        debug!(
            "preprocess: {}/{} pixels foreground after segmentation",
            coverage,
            mask.len()
        );
        Ok(mask)
    }

    /// 5x5 Gaussian smoothing with clamp-to-edge borders; output stays
    /// grayscale.
    pub fn smooth(&self, img: &Image) -> Image {
        let w = self.w;
        let h = self.h;

        // Horizontal pass; each sample sums to at most 255 * 16.
        let horiz: Vec<u16> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                let row = &img[y * w..(y + 1) * w];
                (0..w).map(move |x| {
                    let mut acc = 0u32;
                    for (k, &weight) in GAUSS_KERNEL.iter().enumerate() {
                        let xx = (x as i32 + k as i32 - 2).clamp(0, (w - 1) as i32) as usize;
                        acc += weight * row[xx] as u32;
                    }
                    acc as u16
                })
            })
            .collect();

        // Vertical pass plus normalization by 256 with rounding.
        (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                let horiz = &horiz;
                (0..w).map(move |x| {
                    let mut acc = 0u32;
                    for (k, &weight) in GAUSS_KERNEL.iter().enumerate() {
                        let yy = (y as i32 + k as i32 - 2).clamp(0, (h - 1) as i32) as usize;
                        acc += weight * horiz[yy * w + x] as u32;
                    }
                    ((acc + 128) >> 8) as u8
                })
            })
            .collect()
    }

    /// Inverted global threshold: samples below 127 become foreground,
    /// samples at or above become background.
    pub fn binarize(&self, img: &Image) -> Image {
        img.iter()
            .map(|&p| if p < BINARIZE_THRESHOLD { FOREGROUND } else { BACKGROUND })
            .collect()
    }

    /// Keep only pixels enclosed by the external boundary of a connected
    /// foreground region.
    ///
    /// Background connected to the image border (4-connectivity) is the only
    /// true background; everything else, including holes fully surrounded by
    /// foreground, is rasterized as filled interior.
    pub fn segment(&self, img: &Image) -> Image {
        let w = self.w;
        let h = self.h;
        let mut outside = vec![false; w * h];
        let mut stack: Vec<usize> = Vec::new();

        fn seed(idx: usize, img: &[u8], outside: &mut [bool], stack: &mut Vec<usize>) {
            if img[idx] == BACKGROUND && !outside[idx] {
                outside[idx] = true;
                stack.push(idx);
            }
        }

        for x in 0..w {
            seed(x, img, &mut outside, &mut stack);
            seed((h - 1) * w + x, img, &mut outside, &mut stack);
        }
        for y in 0..h {
            seed(y * w, img, &mut outside, &mut stack);
            seed(y * w + (w - 1), img, &mut outside, &mut stack);
        }

        while let Some(idx) = stack.pop() {
            let x = idx % w;
            let y = idx / w;
            if x > 0 {
                seed(idx - 1, img, &mut outside, &mut stack);
            }
            if x + 1 < w {
                seed(idx + 1, img, &mut outside, &mut stack);
            }
            if y > 0 {
                seed(idx - w, img, &mut outside, &mut stack);
            }
            if y + 1 < h {
                seed(idx + w, img, &mut outside, &mut stack);
            }
        }

        outside
            .iter()
            .map(|&o| if o { BACKGROUND } else { FOREGROUND })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_image(width: usize, height: usize, value: u8) -> Image {
        vec![value; width * height]
    }

    /// Dark ring (foreground after binarization) around a light interior.
    fn ring_image(width: usize, height: usize) -> Image {
        let mut img = vec![200; width * height];
        let (cx, cy) = (width as i32 / 2, height as i32 / 2);
        for y in 0..height {
            for x in 0..width {
                let dx = x as i32 - cx;
                let dy = y as i32 - cy;
                let r2 = dx * dx + dy * dy;
                if (16..=36).contains(&r2) {
                    img[y * width + x] = 10;
                }
            }
        }
        img
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            Preprocessor::new(0, 10),
            Err(PrepError::InvalidImageSize { .. })
        ));
        assert!(matches!(
            Preprocessor::new(10, 0),
            Err(PrepError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let prep = Preprocessor::new(10, 10).unwrap();
        let img = vec![0u8; 50];
        assert!(matches!(
            prep.preprocess(&img),
            Err(PrepError::InvalidImageData { .. })
        ));
    }

    #[test]
    fn output_is_binary_and_same_size() {
        let prep = Preprocessor::new(21, 21).unwrap();
        let mask = prep.preprocess(&ring_image(21, 21)).unwrap();
        assert_eq!(mask.len(), 21 * 21);
        assert!(mask.iter().all(|&p| p == FOREGROUND || p == BACKGROUND));
    }

    #[test]
    fn smoothing_preserves_uniform_images() {
        let prep = Preprocessor::new(16, 16).unwrap();
        let img = uniform_image(16, 16, 93);
        assert_eq!(prep.smooth(&img), img);
    }

    #[test]
    fn binarization_polarity_is_inverted() {
        let prep = Preprocessor::new(2, 2).unwrap();
        let out = prep.binarize(&vec![0, 126, 127, 255]);
        assert_eq!(out, vec![FOREGROUND, FOREGROUND, BACKGROUND, BACKGROUND]);
    }

    #[test]
    fn all_background_input_degenerates_quietly() {
        let prep = Preprocessor::new(12, 12).unwrap();
        let mask = prep.preprocess(&uniform_image(12, 12, 200)).unwrap();
        assert!(mask.iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn segmentation_fills_enclosed_interior() {
        let prep = Preprocessor::new(21, 21).unwrap();
        let mask = prep.preprocess(&ring_image(21, 21)).unwrap();
        // The center of the ring is enclosed by the external contour and must
        // be rasterized as foreground even though it binarized to background.
        assert_eq!(mask[10 * 21 + 10], FOREGROUND);
        // A corner pixel is border-connected background.
        assert_eq!(mask[0], BACKGROUND);
    }

    #[test]
    fn segmentation_keeps_isolated_foreground() {
        let prep = Preprocessor::new(9, 9).unwrap();
        let mut binary = uniform_image(9, 9, BACKGROUND);
        binary[4 * 9 + 4] = FOREGROUND;
        let out = prep.segment(&binary);
        // A lone foreground pixel is its own external contour.
        assert_eq!(out[4 * 9 + 4], FOREGROUND);
        assert_eq!(out.iter().filter(|&&p| p == FOREGROUND).count(), 1);
    }
}
