use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verdict label attached to a verification report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationVerdict {
    /// No tampering indicators found.
    Authentic,
    /// Some indicators found, manual review suggested.
    Suspicious,
    /// Strong tampering indicators found.
    Tampered,
}

impl VerificationVerdict {
    /// Maps an authenticity score (0..=100) to a verdict label.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Authentic,
            50..=79 => Self::Suspicious,
            _ => Self::Tampered,
        }
    }
}

/// A region of the submitted audio flagged by the (simulated) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperSegment {
    /// Segment start offset in seconds.
    pub start_seconds: f64,
    /// Segment end offset in seconds.
    pub end_seconds: f64,
    /// Confidence of the finding (0.0..=1.0).
    pub confidence: f64,
}

/// Result of one verification request.
///
/// Scores are produced by a simulated analysis, not a signal-processing
/// pipeline; the same submission always yields the same report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Report identifier.
    pub report_id: Uuid,
    /// Authenticity score, 0 (tampered) to 100 (authentic).
    pub authenticity_score: u8,
    /// Verdict derived from the score.
    pub verdict: VerificationVerdict,
    /// Flagged regions, empty for authentic verdicts.
    pub segments: Vec<TamperSegment>,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::VerificationVerdict;

    #[test]
    fn score_bands_map_to_verdicts() {
        assert_eq!(
            VerificationVerdict::from_score(95),
            VerificationVerdict::Authentic
        );
        assert_eq!(
            VerificationVerdict::from_score(60),
            VerificationVerdict::Suspicious
        );
        assert_eq!(
            VerificationVerdict::from_score(10),
            VerificationVerdict::Tampered
        );
    }
}
