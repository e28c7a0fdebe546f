//! Simulated audio verification.
//!
//! There is no signal-processing pipeline behind this service: scores and
//! tamper segments are derived from a digest of the submission so that
//! results look plausible and stay stable for the same input.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use fusion_core::{AppError, AppResult};
use fusion_domain::{TamperSegment, VerificationReport, VerificationVerdict};

/// One verification submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// Name of the uploaded audio file.
    pub file_name: String,
    /// Client-computed checksum of the upload.
    pub checksum: String,
}

/// Application service producing simulated verification reports.
#[derive(Clone, Default)]
pub struct VerificationService;

impl VerificationService {
    /// Creates the service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes a submission and returns a report.
    pub fn verify(&self, request: &VerificationRequest) -> AppResult<VerificationReport> {
        if request.file_name.trim().is_empty() {
            return Err(AppError::Validation(
                "file name must not be empty".to_owned(),
            ));
        }
        if request.checksum.trim().is_empty() {
            return Err(AppError::Validation(
                "checksum must not be empty".to_owned(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(request.file_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(request.checksum.as_bytes());
        let digest = hasher.finalize();

        let authenticity_score = digest[0] % 101;
        let verdict = VerificationVerdict::from_score(authenticity_score);
        let segments = match verdict {
            VerificationVerdict::Authentic => Vec::new(),
            VerificationVerdict::Suspicious | VerificationVerdict::Tampered => {
                simulated_segments(&digest)
            }
        };

        Ok(VerificationReport {
            report_id: Uuid::new_v4(),
            authenticity_score,
            verdict,
            segments,
            analyzed_at: Utc::now(),
        })
    }
}

fn simulated_segments(digest: &[u8]) -> Vec<TamperSegment> {
    let segment_count = usize::from(digest[1] % 3) + 1;

    (0..segment_count)
        .map(|index| {
            let base = 2 + index * 3;
            let start_seconds = f64::from(digest[base]) * 0.5;
            let length = f64::from(digest[base + 1] % 20) * 0.25 + 0.25;
            let confidence = f64::from(digest[base + 2] % 60) / 100.0 + 0.4;
            TamperSegment {
                start_seconds,
                end_seconds: start_seconds + length,
                confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use fusion_domain::VerificationVerdict;

    use super::{VerificationRequest, VerificationService};

    fn request(file_name: &str) -> VerificationRequest {
        VerificationRequest {
            file_name: file_name.to_owned(),
            checksum: "3c1f9a".to_owned(),
        }
    }

    #[test]
    fn same_submission_yields_the_same_findings() {
        let service = VerificationService::new();

        let first = service.verify(&request("interview.wav"));
        let second = service.verify(&request("interview.wav"));

        let first = first.ok();
        let second = second.ok();
        assert_eq!(
            first.as_ref().map(|report| report.authenticity_score),
            second.as_ref().map(|report| report.authenticity_score)
        );
        assert_eq!(
            first.map(|report| report.segments),
            second.map(|report| report.segments)
        );
    }

    #[test]
    fn authentic_reports_carry_no_segments() {
        let service = VerificationService::new();

        // Walk a few inputs; every authentic verdict must be segment-free
        // and every non-authentic one must flag at least one region.
        for index in 0..32 {
            let report = service.verify(&request(&format!("take-{index}.wav")));
            let Ok(report) = report else {
                panic!("verification failed for take-{index}");
            };
            assert!(report.authenticity_score <= 100);
            match report.verdict {
                VerificationVerdict::Authentic => assert!(report.segments.is_empty()),
                VerificationVerdict::Suspicious | VerificationVerdict::Tampered => {
                    assert!(!report.segments.is_empty());
                }
            }
        }
    }

    #[test]
    fn blank_file_name_is_rejected() {
        let service = VerificationService::new();
        assert!(service.verify(&request("  ")).is_err());
    }
}
