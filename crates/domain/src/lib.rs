//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod account;
mod rate_limit;
mod threat;
mod verification;

pub use account::{Account, EmailAddress};
pub use rate_limit::{RateLimitEntry, RateLimitPolicy, default_policies};
pub use threat::{SecurityEvent, SecurityEventDraft, ThreatCategory, ThreatLevel};
pub use verification::{TamperSegment, VerificationReport, VerificationVerdict};
