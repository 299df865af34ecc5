use rayon::prelude::*;
use ridgeauth_core::{Descriptor, DescriptorSet};

/// A best mutual match between one probe and one reference descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub probe_idx: usize,
    pub reference_idx: usize,
    pub distance: u32,
}

/// Similarity summary of two descriptor sets.
///
/// `mean_distance` is `None` when no correspondence survived the cross-check;
/// downstream threshold comparisons treat that as infinitely large, so a
/// zero-correspondence result can never be accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub correspondences: usize,
    pub mean_distance: Option<f32>,
}

impl MatchResult {
    pub fn mean_or_infinite(&self) -> f32 {
        self.mean_distance.unwrap_or(f32::INFINITY)
    }
}

/// Hamming distance between two 256-bit descriptors.
#[inline]
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Index and distance of the nearest descriptor in `set`. Ties resolve to
/// the lowest index so the cross-check below is deterministic.
fn nearest(d: &Descriptor, set: &[Descriptor]) -> (usize, u32) {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (idx, candidate) in set.iter().enumerate() {
        let dist = hamming(d, candidate);
        if dist < best_dist {
            best_idx = idx;
            best_dist = dist;
        }
    }
    (best_idx, best_dist)
}

/// Mutual nearest-neighbor correspondences under Hamming distance.
///
/// A probe descriptor's nearest reference descriptor is kept only when that
/// reference descriptor's nearest probe descriptor is the original one.
/// Cross-check filtering trades match count for precision.
pub fn correspondences(probe: &DescriptorSet, reference: &DescriptorSet) -> Vec<Correspondence> {
    let forward: Vec<(usize, u32)> = probe
        .descriptors()
        .par_iter()
        .map(|d| nearest(d, reference.descriptors()))
        .collect();

    let backward: Vec<usize> = reference
        .descriptors()
        .par_iter()
        .map(|d| nearest(d, probe.descriptors()).0)
        .collect();

    forward
        .into_iter()
        .enumerate()
        .filter(|&(probe_idx, (reference_idx, _))| backward[reference_idx] == probe_idx)
        .map(|(probe_idx, (reference_idx, distance))| Correspondence {
            probe_idx,
            reference_idx,
            distance,
        })
        .collect()
}

/// Compare two descriptor sets and summarize the surviving correspondences.
pub fn match_sets(probe: &DescriptorSet, reference: &DescriptorSet) -> MatchResult {
    let pairs = correspondences(probe, reference);
    let mean_distance = if pairs.is_empty() {
        None
    } else {
        let total: u32 = pairs.iter().map(|c| c.distance).sum();
        Some(total as f32 / pairs.len() as f32)
    };

    MatchResult {
        correspondences: pairs.len(),
        mean_distance,
    }
}
