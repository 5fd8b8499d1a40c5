use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{KycId, UserId};
use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    NationalId,
    DrivingLicense,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Passport => "passport",
            DocumentType::NationalId => "national_id",
            DocumentType::DrivingLicense => "driving_license",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passport" => Ok(DocumentType::Passport),
            "national_id" => Ok(DocumentType::NationalId),
            "driving_license" => Ok(DocumentType::DrivingLicense),
            _ => Err(WalletError::InvalidDocumentType(s.to_string())),
        }
    }
}

/// KYC FSM states: `pending -> verified | rejected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, KycStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Verified => "verified",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who resolves a pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewChannel {
    Provider,
    ManualReview,
}

/// Raw submission as received. Every field is optional here so that a
/// missing field and a blank one report the same `missing_field` error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KycApplication {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub country: Option<String>,
}

/// Validated submission, as sent to the KYC provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KycSubmission {
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    /// ISO 3166-1 alpha-2, uppercase
    pub country: String,
}

/// Resolution of a pending record (provider webhook or manual reviewer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRecord {
    #[serde(rename = "kycID")]
    pub id: KycId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub country: String,
    pub status: KycStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub review_channel: ReviewChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

impl KycRecord {
    pub fn pending(submission: KycSubmission) -> Self {
        Self {
            id: KycId::new(),
            user_id: submission.user_id,
            document_type: submission.document_type,
            document_number: submission.document_number,
            full_name: submission.full_name,
            date_of_birth: submission.date_of_birth,
            country: submission.country,
            status: KycStatus::Pending,
            submitted_at: Utc::now(),
            verified_at: None,
            rejection_reason: None,
            review_channel: ReviewChannel::Provider,
            estimated_completion_at: None,
        }
    }

    fn ensure_pending(&self, to: KycStatus) -> WalletResult<()> {
        if self.status != KycStatus::Pending {
            return Err(WalletError::InvalidStateTransition(format!(
                "kyc {} {} -> {}",
                self.id, self.status, to
            )));
        }
        Ok(())
    }

    pub fn verify(&mut self) -> WalletResult<()> {
        self.ensure_pending(KycStatus::Verified)?;
        self.status = KycStatus::Verified;
        self.verified_at = Some(Utc::now());
        self.estimated_completion_at = None;
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>) -> WalletResult<()> {
        self.ensure_pending(KycStatus::Rejected)?;
        self.status = KycStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.estimated_completion_at = None;
        Ok(())
    }

    pub fn apply(&mut self, decision: &ReviewDecision) -> WalletResult<()> {
        match decision {
            ReviewDecision::Approve => self.verify(),
            ReviewDecision::Reject { reason } => self.reject(reason.clone()),
        }
    }
}
