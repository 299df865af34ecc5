pub mod logger;

use log::{debug, info, warn};
use ridgeauth_core::{
    AuthLevel, DescriptorSet, Image, Keypoint, PipelineConfig, ThresholdTable, init_thread_pool,
};
use ridgeauth_features::{FeatureError, FeatureExtractor};
use ridgeauth_match::{AuthPolicy, Decision, Registry, RegistrationOutcome};
use ridgeauth_prep::{PrepError, Preprocessor};

pub use ridgeauth_core::{self, AuthLevel as Level, PipelineConfig as Config};

#[derive(Debug)]
pub enum EngineError {
    Prep(PrepError),
    Feature(FeatureError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Prep(e) => write!(f, "Preprocessing error: {}", e),
            EngineError::Feature(e) => write!(f, "Feature extraction error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<PrepError> for EngineError {
    fn from(err: PrepError) -> Self {
        EngineError::Prep(err)
    }
}

impl From<FeatureError> for EngineError {
    fn from(err: FeatureError) -> Self {
        EngineError::Feature(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// High-level authentication engine wiring the full pipeline:
/// preprocess -> extract -> match -> level policy.
///
/// Owns the registry and the injected threshold table. All image decoding is
/// the host's job; the engine consumes raw grayscale buffers of arbitrary
/// dimensions and constructs the dimension-bound pipeline stages per call.
/// The registered reference lives only as long as the engine value.
pub struct AuthEngine {
    cfg: PipelineConfig,
    policy: AuthPolicy,
    registry: Registry,
}

impl AuthEngine {
    pub fn new(cfg: PipelineConfig, thresholds: ThresholdTable) -> Self {
        // The global pool can only be built once per process; later engines
        // reuse it.
        let _ = init_thread_pool(cfg.n_threads);
        Self {
            cfg,
            policy: AuthPolicy::new(thresholds),
            registry: Registry::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default(), ThresholdTable::default())
    }

    /// Run preprocessing and extraction on one raw grayscale buffer.
    ///
    /// `Ok(None)` is the extraction-failure outcome (nothing salient found);
    /// errors are contract violations only.
    pub fn describe(
        &self,
        img: &Image,
        width: usize,
        height: usize,
    ) -> EngineResult<Option<DescriptorSet>> {
        let prep = Preprocessor::new(width, height)?;
        let mask = prep.preprocess(img)?;
        let extractor = FeatureExtractor::new(self.cfg.clone(), width, height)?;
        Ok(extractor.extract(&mask)?)
    }

    /// Register `img` as the reference at `level`, replacing any prior
    /// reference. On extraction failure the prior reference is left intact.
    pub fn register(
        &mut self,
        img: &Image,
        width: usize,
        height: usize,
        level: AuthLevel,
    ) -> EngineResult<RegistrationOutcome> {
        match self.describe(img, width, height)? {
            Some(set) => {
                info!("registered reference with {} descriptors at level {}", set.len(), level);
                self.registry.register(set, level);
                Ok(RegistrationOutcome::Registered(level))
            }
            None => {
                warn!("registration rejected: extraction produced no descriptors");
                Ok(RegistrationOutcome::NoFeatures)
            }
        }
    }

    /// Authenticate `img` against the current reference under `claimed`.
    pub fn authenticate(
        &self,
        img: &Image,
        width: usize,
        height: usize,
        claimed: AuthLevel,
    ) -> EngineResult<Decision> {
        let probe = self.describe(img, width, height)?;
        debug!(
            "authenticating at claimed level {} (probe descriptors: {})",
            claimed,
            probe.as_ref().map_or(0, DescriptorSet::len)
        );
        Ok(self.policy.decide(probe.as_ref(), claimed, &self.registry))
    }

    /// Keypoints of one image, for host-side visualization. Purely an
    /// observer: shares no state with registration or authentication.
    pub fn keypoints(
        &self,
        img: &Image,
        width: usize,
        height: usize,
    ) -> EngineResult<Vec<Keypoint>> {
        Ok(self
            .describe(img, width, height)?
            .map(|set| set.keypoints().to_vec())
            .unwrap_or_default())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeauth_core::LevelThresholds;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            fast_threshold: 20,
            patch_size: 5,
            n_threads: 1,
        }
    }

    fn lenient_table() -> ThresholdTable {
        let bounds = LevelThresholds { min_correspondences: 0, max_mean_distance: 256.0 };
        ThresholdTable { level1: bounds, level2: bounds, level3: bounds }
    }

    /// Light background with a grid of dark blobs; binarization turns the
    /// blobs into foreground structure rich in corners.
    fn print_like_image(width: usize, height: usize) -> Image {
        let mut img = vec![200u8; width * height];
        let mut cy = 8;
        while cy + 8 < height {
            let mut cx = 8;
            while cx + 8 < width {
                for dy in 0..5 {
                    for dx in 0..5 {
                        img[(cy + dy) * width + cx + dx] = 10;
                    }
                }
                cx += 16;
            }
            cy += 16;
        }
        img
    }

    fn blank_image(width: usize, height: usize) -> Image {
        vec![200u8; width * height]
    }

    #[test]
    fn authenticate_before_register_denies_every_level() {
        let engine = AuthEngine::new(test_config(), lenient_table());
        let img = print_like_image(96, 96);
        for level in [AuthLevel::One, AuthLevel::Two, AuthLevel::Three] {
            let decision = engine.authenticate(&img, 96, 96, level).unwrap();
            assert_eq!(decision, Decision::Deny);
        }
    }

    #[test]
    fn identical_image_authenticates_at_registered_level() {
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        let img = print_like_image(96, 96);
        let outcome = engine.register(&img, 96, 96, AuthLevel::Two).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered(AuthLevel::Two));

        let probe = img.clone();
        let decision = engine.authenticate(&probe, 96, 96, AuthLevel::Two).unwrap();
        assert!(decision.is_accept(), "self-match must accept: {:?}", decision);
    }

    #[test]
    fn claimed_level_must_equal_registered_level() {
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        let img = print_like_image(96, 96);
        engine.register(&img, 96, 96, AuthLevel::Two).unwrap();

        for claimed in [AuthLevel::One, AuthLevel::Three] {
            let decision = engine.authenticate(&img, 96, 96, claimed).unwrap();
            assert_eq!(decision, Decision::Deny);
        }
    }

    #[test]
    fn featureless_probe_denies_even_after_registration() {
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        let img = print_like_image(96, 96);
        engine.register(&img, 96, 96, AuthLevel::One).unwrap();

        let blank = blank_image(96, 96);
        let decision = engine.authenticate(&blank, 96, 96, AuthLevel::One).unwrap();
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn featureless_registration_fails_and_keeps_prior_reference() {
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        let img = print_like_image(96, 96);
        engine.register(&img, 96, 96, AuthLevel::One).unwrap();

        let outcome = engine.register(&blank_image(96, 96), 96, 96, AuthLevel::Three).unwrap();
        assert_eq!(outcome, RegistrationOutcome::NoFeatures);

        // The earlier reference still authenticates at its original level.
        let decision = engine.authenticate(&img, 96, 96, AuthLevel::One).unwrap();
        assert!(decision.is_accept());
    }

    #[test]
    fn solid_dark_image_yields_no_features() {
        // An all-dark buffer binarizes to an all-foreground mask, a single
        // contrast-free plateau. It must not register, and authenticating
        // the same buffer must deny rather than match plateau artifacts.
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        let solid = vec![0u8; 64 * 64];

        let outcome = engine.register(&solid, 64, 64, AuthLevel::One).unwrap();
        assert_eq!(outcome, RegistrationOutcome::NoFeatures);

        let decision = engine.authenticate(&solid, 64, 64, AuthLevel::One).unwrap();
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn keypoints_observer_reports_features() {
        let engine = AuthEngine::new(test_config(), lenient_table());
        assert!(!engine.keypoints(&print_like_image(96, 96), 96, 96).unwrap().is_empty());
        assert!(engine.keypoints(&blank_image(96, 96), 96, 96).unwrap().is_empty());
    }

    #[test]
    fn probe_dimensions_may_differ_from_reference() {
        let mut engine = AuthEngine::new(test_config(), lenient_table());
        engine.register(&print_like_image(96, 96), 96, 96, AuthLevel::One).unwrap();
        // A differently sized probe goes through its own pipeline geometry;
        // the decision is still well defined.
        let probe = print_like_image(64, 64);
        let decision = engine.authenticate(&probe, 64, 64, AuthLevel::One).unwrap();
        assert!(matches!(decision, Decision::Accept(_) | Decision::Deny));
    }
}
