use crate::matcher::{MatchResult, match_sets};
use crate::registry::Registry;
use log::debug;
use ridgeauth_core::{AuthLevel, DescriptorSet, LevelThresholds, ThresholdTable};

/// Uniform user-facing refusal text. Every failing check produces exactly
/// this message so a caller cannot tell which check failed.
pub const DENIED_MESSAGE: &str = "Access denied";

/// Level-specific welcome text shown on acceptance.
pub fn welcome_message(level: AuthLevel) -> &'static str {
    match level {
        AuthLevel::One => "Welcome! You have level 1 access. Enjoy!",
        AuthLevel::Two => "Level 2 access granted. Welcome, division director.",
        AuthLevel::Three => "Level 3 access granted. Welcome, minister.",
    }
}

/// Full diagnostic outcome of one authentication attempt. Only `Granted`
/// and the uniform denial are ever user-visible; the refusal taxonomy exists
/// for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Granted { level: AuthLevel },
    /// No registration has occurred yet.
    NoReference,
    /// Extraction failed on the probe image.
    EmptyProbe,
    /// Claimed level differs from the registered level.
    LevelMismatch { claimed: AuthLevel, registered: AuthLevel },
    /// Matching ran but the evidence missed the level's thresholds.
    InsufficientEvidence { result: MatchResult },
}

/// Caller-visible decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept(String),
    Deny,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Decision::Accept(message) => message,
            Decision::Deny => DENIED_MESSAGE,
        }
    }
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Granted { level } => Decision::Accept(welcome_message(level).to_string()),
            _ => Decision::Deny,
        }
    }
}

fn meets(result: &MatchResult, thresholds: LevelThresholds) -> bool {
    // Both bounds strict; an undefined mean compares as infinite and fails.
    result.correspondences > thresholds.min_correspondences
        && result.mean_or_infinite() < thresholds.max_mean_distance
}

/// Level-gated accept/deny policy over descriptor matching.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    thresholds: ThresholdTable,
}

impl AuthPolicy {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Evaluate a probe against the registry, first failing check refuses.
    ///
    /// Matching runs only after the reference, probe and level checks pass,
    /// so a probe can never be compared under a level it was not registered
    /// for.
    pub fn evaluate(
        &self,
        probe: Option<&DescriptorSet>,
        claimed: AuthLevel,
        registry: &Registry,
    ) -> Verdict {
        let Some(reference) = registry.reference() else {
            return Verdict::NoReference;
        };
        let Some(probe) = probe else {
            return Verdict::EmptyProbe;
        };
        if claimed != reference.level {
            return Verdict::LevelMismatch {
                claimed,
                registered: reference.level,
            };
        }

        let result = match_sets(probe, &reference.descriptors);
        if meets(&result, self.thresholds.get(claimed)) {
            Verdict::Granted { level: claimed }
        } else {
            Verdict::InsufficientEvidence { result }
        }
    }

    /// Evaluate and collapse to the caller-visible decision, logging the
    /// full verdict at debug level.
    pub fn decide(
        &self,
        probe: Option<&DescriptorSet>,
        claimed: AuthLevel,
        registry: &Registry,
    ) -> Decision {
        let verdict = self.evaluate(probe, claimed, registry);
        debug!("authentication verdict: {:?}", verdict);
        verdict.into()
    }
}
