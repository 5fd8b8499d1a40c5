use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use super::types::{
    DocumentType, KycApplication, KycRecord, KycStatus, KycSubmission, ReviewChannel,
    ReviewDecision,
};
use crate::core_types::{KycId, UserId};
use crate::error::{WalletError, WalletResult};
use crate::resilience::{KycVerification, ResilientKycVerifier};

/// Read side used by the wallet registry
pub trait KycLookup: Send + Sync {
    fn is_verified(&self, user_id: &str) -> bool;
}

/// KYC records and the manual-review queue
pub struct KycGate {
    records: DashMap<KycId, KycRecord>,
    /// Latest record per user
    by_user: DashMap<UserId, KycId>,
    manual_review: DashMap<KycId, ()>,
    supported_countries: HashSet<String>,
    verifier: ResilientKycVerifier,
}

impl KycGate {
    pub fn new<I, S>(supported_countries: I, verifier: ResilientKycVerifier) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            records: DashMap::new(),
            by_user: DashMap::new(),
            manual_review: DashMap::new(),
            supported_countries: supported_countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .collect(),
            verifier,
        }
    }

    /// Validate, store as pending, then verify through the provider.
    ///
    /// # Errors
    /// * `MissingField` / `InvalidDocumentType` / `InvalidDateOfBirth` / `InvalidCountry`
    /// * `DuplicateKyc` - a pending or verified record exists for the user
    /// * `DependencyUnavailable` - provider failed below the breaker threshold
    pub async fn submit(&self, user_id: &str, application: KycApplication) -> WalletResult<KycRecord> {
        let submission = self.validate(user_id, application)?;
        let (record_id, previous) = self.reserve(submission.clone())?;

        let verification = match self.verifier.verify(&submission).await {
            Ok(v) => v,
            Err(e) => {
                self.release(user_id, record_id, previous);
                return Err(e);
            }
        };

        let mut record = self
            .records
            .get_mut(&record_id)
            .ok_or(WalletError::KycNotFound(record_id))?;
        match verification {
            KycVerification::Verified => record.verify()?,
            KycVerification::Rejected(reason) => record.reject(reason)?,
            KycVerification::AwaitingProvider => {}
            KycVerification::ManualReview {
                estimated_completion_at,
            } => {
                record.review_channel = ReviewChannel::ManualReview;
                record.estimated_completion_at = Some(estimated_completion_at);
                self.manual_review.insert(record_id, ());
            }
        }

        info!(
            kyc_id = %record.id,
            user_id,
            status = %record.status,
            channel = ?record.review_channel,
            "kyc submitted"
        );
        Ok(record.clone())
    }

    /// Resolve a pending record and drop it from the manual-review queue.
    pub fn complete_review(&self, kyc_id: KycId, decision: &ReviewDecision) -> WalletResult<KycRecord> {
        let mut record = self
            .records
            .get_mut(&kyc_id)
            .ok_or(WalletError::KycNotFound(kyc_id))?;
        record.apply(decision)?;
        self.manual_review.remove(&kyc_id);

        info!(
            kyc_id = %kyc_id,
            user_id = %record.user_id,
            status = %record.status,
            "kyc review completed"
        );
        Ok(record.clone())
    }

    /// Records awaiting a manual reviewer, oldest first
    pub fn manual_review_queue(&self) -> Vec<KycRecord> {
        let ids: Vec<KycId> = self.manual_review.iter().map(|e| *e.key()).collect();
        let mut queue: Vec<KycRecord> = ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| r.clone()))
            .collect();
        queue.sort_by_key(|r| r.submitted_at);
        queue
    }

    pub fn get(&self, kyc_id: KycId) -> WalletResult<KycRecord> {
        self.records
            .get(&kyc_id)
            .map(|r| r.clone())
            .ok_or(WalletError::KycNotFound(kyc_id))
    }

    /// Latest record of a user, if any
    pub fn status_for_user(&self, user_id: &str) -> Option<KycRecord> {
        let id = *self.by_user.get(user_id)?;
        self.records.get(&id).map(|r| r.clone())
    }

    fn validate(&self, user_id: &str, app: KycApplication) -> WalletResult<KycSubmission> {
        fn required(value: Option<String>, field: &str) -> WalletResult<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(WalletError::MissingField(field.to_string())),
            }
        }

        if user_id.trim().is_empty() {
            return Err(WalletError::MissingField("userID".to_string()));
        }
        let document_type = required(app.document_type, "documentType")?;
        let document_number = required(app.document_number, "documentNumber")?;
        let full_name = required(app.full_name, "fullName")?;
        let date_of_birth = required(app.date_of_birth, "dateOfBirth")?;
        let country = required(app.country, "country")?;

        let document_type: DocumentType = document_type.parse()?;

        let date_of_birth = NaiveDate::parse_from_str(&date_of_birth, "%Y-%m-%d")
            .map_err(|_| WalletError::InvalidDateOfBirth(date_of_birth.clone()))?;
        if date_of_birth >= Utc::now().date_naive() {
            return Err(WalletError::InvalidDateOfBirth(date_of_birth.to_string()));
        }

        let country = country.to_ascii_uppercase();
        if !self.supported_countries.contains(&country) {
            return Err(WalletError::InvalidCountry(country));
        }

        Ok(KycSubmission {
            user_id: user_id.to_string(),
            document_type,
            document_number,
            full_name,
            date_of_birth,
            country,
        })
    }

    /// Atomically store a pending record unless the user already has a live
    /// one. Returns the new id and the rejected record it supersedes.
    fn reserve(&self, submission: KycSubmission) -> WalletResult<(KycId, Option<KycId>)> {
        let record = KycRecord::pending(submission);
        let record_id = record.id;

        match self.by_user.entry(record.user_id.clone()) {
            Entry::Occupied(mut slot) => {
                let previous = *slot.get();
                let resubmittable = self
                    .records
                    .get(&previous)
                    .is_none_or(|r| r.status == KycStatus::Rejected);
                if !resubmittable {
                    return Err(WalletError::DuplicateKyc);
                }
                self.records.insert(record_id, record);
                slot.insert(record_id);
                Ok((record_id, Some(previous)))
            }
            Entry::Vacant(slot) => {
                self.records.insert(record_id, record);
                slot.insert(record_id);
                Ok((record_id, None))
            }
        }
    }

    /// Undo `reserve` after a failed provider call
    fn release(&self, user_id: &str, record_id: KycId, previous: Option<KycId>) {
        self.records.remove(&record_id);
        match previous {
            Some(prev) => {
                if let Some(mut slot) = self.by_user.get_mut(user_id) {
                    if *slot == record_id {
                        *slot = prev;
                    }
                }
            }
            None => {
                self.by_user.remove_if(user_id, |_, id| *id == record_id);
            }
        }
        warn!(kyc_id = %record_id, user_id, "kyc submission released after provider failure");
    }
}

impl KycLookup for KycGate {
    fn is_verified(&self, user_id: &str) -> bool {
        self.status_for_user(user_id)
            .is_some_and(|r| r.status == KycStatus::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::SimulatedKycProvider;
    use crate::resilience::{BreakerConfig, CircuitBreaker};
    use std::sync::Arc;
    use std::time::Duration;

    fn gate() -> (KycGate, Arc<SimulatedKycProvider>) {
        let provider = Arc::new(SimulatedKycProvider::new());
        let breaker = Arc::new(CircuitBreaker::new(
            "kyc_provider",
            BreakerConfig {
                failure_threshold: 3,
                cooldown: Duration::from_secs(60),
                call_timeout: Duration::from_secs(1),
            },
        ));
        let verifier =
            ResilientKycVerifier::new(provider.clone(), breaker, Duration::from_secs(48 * 3600));
        (KycGate::new(["TH", "SG", "MY"], verifier), provider)
    }

    fn application(country: &str) -> KycApplication {
        KycApplication {
            document_type: Some("passport".into()),
            document_number: Some("AA1234567".into()),
            full_name: Some("Somchai Jaidee".into()),
            date_of_birth: Some("1990-01-31".into()),
            country: Some(country.into()),
        }
    }

    #[tokio::test]
    async fn test_submit_verifies() {
        let (gate, _) = gate();
        let record = gate.submit("u1", application("th")).await.unwrap();
        assert_eq!(record.status, KycStatus::Verified);
        assert_eq!(record.country, "TH");
        assert!(record.verified_at.is_some());
        assert!(gate.is_verified("u1"));
        assert!(!gate.is_verified("u2"));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (gate, _) = gate();

        let mut app = application("TH");
        app.full_name = Some("   ".into());
        assert_eq!(
            gate.submit("u1", app).await,
            Err(WalletError::MissingField("fullName".into()))
        );

        let mut app = application("TH");
        app.country = None;
        assert_eq!(
            gate.submit("u1", app).await,
            Err(WalletError::MissingField("country".into()))
        );

        assert_eq!(
            gate.submit("u1", application("US")).await,
            Err(WalletError::InvalidCountry("US".into()))
        );

        let mut app = application("TH");
        app.date_of_birth = Some("31/01/1990".into());
        assert!(matches!(
            gate.submit("u1", app).await,
            Err(WalletError::InvalidDateOfBirth(_))
        ));

        let mut app = application("TH");
        app.date_of_birth = Some("2999-01-01".into());
        assert!(matches!(
            gate.submit("u1", app).await,
            Err(WalletError::InvalidDateOfBirth(_))
        ));

        // Nothing was stored
        assert!(gate.status_for_user("u1").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_resubmit_after_rejection() {
        let (gate, provider) = gate();
        provider.set_reject(true);
        let rejected = gate.submit("u1", application("TH")).await.unwrap();
        assert_eq!(rejected.status, KycStatus::Rejected);
        assert!(rejected.rejection_reason.is_some());

        provider.set_reject(false);
        let verified = gate.submit("u1", application("TH")).await.unwrap();
        assert_eq!(verified.status, KycStatus::Verified);
        assert_ne!(verified.id, rejected.id);

        assert_eq!(
            gate.submit("u1", application("TH")).await,
            Err(WalletError::DuplicateKyc)
        );
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_no_record() {
        let (gate, provider) = gate();
        provider.set_fail(true);
        assert!(matches!(
            gate.submit("u1", application("TH")).await,
            Err(WalletError::DependencyUnavailable { .. })
        ));
        assert!(gate.status_for_user("u1").is_none());
    }

    #[tokio::test]
    async fn test_manual_review_fallback_and_completion() {
        let (gate, provider) = gate();
        provider.set_fail(true);
        for user in ["u1", "u2"] {
            let _ = gate.submit(user, application("TH")).await;
        }
        // Third consecutive failure opens the circuit
        let queued = gate.submit("u3", application("TH")).await.unwrap();
        assert_eq!(queued.status, KycStatus::Pending);
        assert_eq!(queued.review_channel, ReviewChannel::ManualReview);
        let eta = queued.estimated_completion_at.unwrap();
        assert!(eta > Utc::now() + chrono::Duration::hours(47));

        assert_eq!(gate.manual_review_queue().len(), 1);
        assert!(!gate.is_verified("u3"));

        let done = gate
            .complete_review(queued.id, &ReviewDecision::Approve)
            .unwrap();
        assert_eq!(done.status, KycStatus::Verified);
        assert!(gate.manual_review_queue().is_empty());
        assert!(gate.is_verified("u3"));

        assert!(matches!(
            gate.complete_review(queued.id, &ReviewDecision::Approve),
            Err(WalletError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_async_provider_stays_pending() {
        let (gate, provider) = gate();
        provider.set_defer(true);
        let record = gate.submit("u1", application("SG")).await.unwrap();
        assert_eq!(record.status, KycStatus::Pending);
        assert_eq!(record.review_channel, ReviewChannel::Provider);
        assert!(gate.manual_review_queue().is_empty());

        // Pending blocks a second submission
        assert_eq!(
            gate.submit("u1", application("SG")).await,
            Err(WalletError::DuplicateKyc)
        );

        let record = gate
            .complete_review(
                record.id,
                &ReviewDecision::Reject {
                    reason: "document expired".into(),
                },
            )
            .unwrap();
        assert_eq!(record.status, KycStatus::Rejected);
        assert_eq!(gate.get(record.id).unwrap().status, KycStatus::Rejected);
    }
}
