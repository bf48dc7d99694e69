//! Trust classification for ingested reports.
//!
//! An event is `verified` only when the plausibility oracle accepts the
//! triggering report *and* the corroboration search found at least one post.
//! Both signals are taken from the triggering report alone, so a later
//! uncorroborated duplicate moves an event back to `pending`.

use reliefmap_common::{CorroborationPost, Evidence, Verification, VerificationStatus};

/// How much of an attached image the plausibility oracle gets to see.
pub const IMAGE_EVIDENCE_PREFIX_CHARS: usize = 100;

/// Outcome of the corroboration search for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Corroboration {
    pub post_count: usize,
}

impl Corroboration {
    /// Search failed or returned nothing.
    pub fn none() -> Self {
        Self { post_count: 0 }
    }

    pub fn from_posts(posts: &[CorroborationPost]) -> Self {
        Self {
            post_count: posts.len(),
        }
    }

    pub fn corroborated(&self) -> bool {
        self.post_count > 0
    }

    pub fn summary(&self) -> String {
        if self.corroborated() {
            format!("Found {} recent tweets about this event.", self.post_count)
        } else {
            "No recent tweets found.".to_string()
        }
    }
}

pub fn classify(plausible: bool, corroborated: bool) -> VerificationStatus {
    if plausible && corroborated {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Pending
    }
}

/// Verification fields for an event touched by the current report.
pub fn verification(plausible: bool, corroboration: &Corroboration) -> Verification {
    Verification {
        gemini_verified: plausible,
        twitter_verified: corroboration.corroborated(),
        verification_status: classify(plausible, corroboration.corroborated()),
        tweets_summary: corroboration.summary(),
    }
}

/// Evidence handed to the plausibility oracle.
pub fn evidence(corroboration: &Corroboration, image: Option<&str>) -> Evidence {
    Evidence {
        tweets_summary: corroboration.summary(),
        image_prefix: image.map(|i| i.chars().take(IMAGE_EVIDENCE_PREFIX_CHARS).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_requires_both_signals() {
        assert_eq!(classify(true, true), VerificationStatus::Verified);
        assert_eq!(classify(true, false), VerificationStatus::Pending);
        assert_eq!(classify(false, true), VerificationStatus::Pending);
        assert_eq!(classify(false, false), VerificationStatus::Pending);
    }

    #[test]
    fn summary_reports_post_count() {
        assert_eq!(
            Corroboration { post_count: 3 }.summary(),
            "Found 3 recent tweets about this event."
        );
        assert_eq!(Corroboration::none().summary(), "No recent tweets found.");
    }

    #[test]
    fn verification_copies_signals() {
        let v = verification(true, &Corroboration { post_count: 2 });
        assert!(v.gemini_verified);
        assert!(v.twitter_verified);
        assert_eq!(v.verification_status, VerificationStatus::Verified);

        let v = verification(true, &Corroboration::none());
        assert!(!v.twitter_verified);
        assert_eq!(v.verification_status, VerificationStatus::Pending);
        assert_eq!(v.tweets_summary, "No recent tweets found.");
    }

    #[test]
    fn image_evidence_is_truncated() {
        let image = format!("data:image/png;base64,{}", "A".repeat(500));
        let ev = evidence(&Corroboration::none(), Some(&image));
        let prefix = ev.image_prefix.unwrap();
        assert_eq!(prefix.chars().count(), IMAGE_EVIDENCE_PREFIX_CHARS);
        assert!(image.starts_with(&prefix));

        assert!(evidence(&Corroboration::none(), None).image_prefix.is_none());
    }
}
