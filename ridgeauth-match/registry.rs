use ridgeauth_core::{AuthLevel, DescriptorSet};

/// The single enrolled fingerprint: its descriptor set and the level it was
/// registered under. The set is non-empty by `DescriptorSet` construction.
#[derive(Debug, Clone)]
pub struct RegisteredReference {
    pub descriptors: DescriptorSet,
    pub level: AuthLevel,
}

/// Owns at most one [`RegisteredReference`].
///
/// A plain value object rather than process-global state: the host creates
/// and passes it in, so tests can run any number of independent registries.
/// Each registration replaces the previous reference wholesale; there is no
/// history and no versioning.
#[derive(Debug, Default)]
pub struct Registry {
    current: Option<RegisteredReference>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptors: DescriptorSet, level: AuthLevel) {
        self.current = Some(RegisteredReference { descriptors, level });
    }

    pub fn reference(&self) -> Option<&RegisteredReference> {
        self.current.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.current.is_some()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Result of a registration attempt, reported distinctly so the operator
/// knows whether the reference was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The reference was replaced and is now registered at this level.
    Registered(AuthLevel),
    /// Extraction found no features; any prior reference is left untouched.
    NoFeatures,
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered(_))
    }
}

impl std::fmt::Display for RegistrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationOutcome::Registered(level) => {
                write!(f, "Fingerprint registered at level {}", level)
            }
            RegistrationOutcome::NoFeatures => {
                write!(f, "Registration failed: no features could be extracted")
            }
        }
    }
}
