mod matcher;
mod policy;
mod registry;

pub use matcher::{Correspondence, MatchResult, correspondences, hamming, match_sets};
pub use policy::{AuthPolicy, DENIED_MESSAGE, Decision, Verdict, welcome_message};
pub use registry::{RegisteredReference, Registry, RegistrationOutcome};
