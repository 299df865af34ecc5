/// Authentication tier. Higher tiers demand stronger match evidence.
///
/// The enumeration is closed on purpose: a claimed level that is not one of
/// the three tiers is rejected at the boundary (`TryFrom<u8>`), never mapped
/// to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuthLevel {
    One = 1,
    Two = 2,
    Three = 3,
}

impl AuthLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLevel(pub u8);

impl std::fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid authentication level: {} (must be 1-3)", self.0)
    }
}

impl std::error::Error for InvalidLevel {}

impl TryFrom<u8> for AuthLevel {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AuthLevel::One),
            2 => Ok(AuthLevel::Two),
            3 => Ok(AuthLevel::Three),
            other => Err(InvalidLevel(other)),
        }
    }
}

/// Acceptance bounds for one level: both must hold, strictly.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelThresholds {
    /// Accepted when the surviving correspondence count exceeds this.
    pub min_correspondences: usize,
    /// Accepted when the mean Hamming distance stays below this.
    pub max_mean_distance: f32,
}

/// Per-level acceptance bounds, injectable so operators can recalibrate
/// without touching matching logic.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdTable {
    pub level1: LevelThresholds,
    pub level2: LevelThresholds,
    pub level3: LevelThresholds,
}

impl ThresholdTable {
    pub fn get(&self, level: AuthLevel) -> LevelThresholds {
        match level {
            AuthLevel::One => self.level1,
            AuthLevel::Two => self.level2,
            AuthLevel::Three => self.level3,
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            level1: LevelThresholds { min_correspondences: 30, max_mean_distance: 40.0 },
            level2: LevelThresholds { min_correspondences: 50, max_mean_distance: 30.0 },
            level3: LevelThresholds { min_correspondences: 70, max_mean_distance: 20.0 },
        }
    }
}
