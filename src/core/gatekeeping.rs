//! Publish/withhold policy.
//!
//! Unverifiable claims flow through to publication; claims a source rated
//! "verified" are held back for editorial review. Every other rating,
//! including "error" and "false", publishes.

use crate::domain::PublishStatus;

/// Replaceable editorial policy
pub trait GatekeepingPolicy: Send + Sync {
    fn decide(&self, textual_rating: &str) -> PublishStatus;
}

/// Rating-based policy
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingPolicy;

impl GatekeepingPolicy for RatingPolicy {
    fn decide(&self, textual_rating: &str) -> PublishStatus {
        decide(textual_rating)
    }
}

pub fn decide(textual_rating: &str) -> PublishStatus {
    if textual_rating.trim().eq_ignore_ascii_case("verified") {
        PublishStatus::Withheld
    } else {
        PublishStatus::Published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unverified_publishes() {
        for rating in ["unverified", "Unverified", "UNVERIFIED"] {
            assert_eq!(decide(rating), PublishStatus::Published);
        }
    }

    #[test]
    fn test_verified_withheld() {
        for rating in ["verified", "Verified", "VERIFIED"] {
            assert_eq!(decide(rating), PublishStatus::Withheld);
        }
    }

    #[test]
    fn test_other_ratings_publish() {
        for rating in ["Error", "FALSE", "partially true", "True", "", "verified!"] {
            assert_eq!(decide(rating), PublishStatus::Published, "rating {:?}", rating);
        }
    }

    #[test]
    fn test_policy_object() {
        let policy: &dyn GatekeepingPolicy = &RatingPolicy;
        assert_eq!(policy.decide("Verified"), PublishStatus::Withheld);
    }
}
