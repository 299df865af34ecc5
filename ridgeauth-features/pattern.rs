/// Number of intensity comparisons per descriptor (one bit each).
pub const PATTERN_BITS: usize = 256;

/// Radius of the square patch the comparison points are drawn from.
pub const PATCH_RADIUS: i32 = 15;

const PATTERN_SEED: u32 = 0x9E37_79B9;

/// Fixed layout of 256 point pairs inside the descriptor patch.
///
/// The layout is generated once from a fixed seed, so every extractor
/// produces bit-for-bit comparable descriptors. A learned layout (as in the
/// BRIEF paper) would decorrelate bits better; a reproducible pseudo-random
/// one is sufficient for Hamming matching.
pub struct SamplingPattern {
    pairs: Vec<(i8, i8, i8, i8)>,
}

impl SamplingPattern {
    pub fn new() -> Self {
        let mut state = PATTERN_SEED;
        let mut coord = move || {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % (2 * PATCH_RADIUS as u32 + 1)) as i8 - PATCH_RADIUS as i8
        };

        let pairs = (0..PATTERN_BITS)
            .map(|_| (coord(), coord(), coord(), coord()))
            .collect();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(i8, i8, i8, i8)] {
        &self.pairs
    }
}

impl Default for SamplingPattern {
    fn default() -> Self {
        Self::new()
    }
}
