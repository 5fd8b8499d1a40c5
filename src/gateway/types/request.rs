//! Request DTOs and the validating JSON extractor
//!
//! Every DTO rejects unknown fields. Values that carry documented error codes
//! (currency, payment method, document type) stay strings here and are
//! validated by the engine, so the error a client sees does not depend on
//! which layer caught it.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::response::ApiError;
use crate::core_types::{KycId, ReferenceId, WalletId};
use crate::error::WalletError;
use crate::kyc::{KycApplication, ReviewDecision};
use crate::money::deserialize_amount;
use crate::transfer::{SettlementOutcome, TopUpRequest, TransferRequest};

// ============================================================================
// ValidatedJson: Axum Framework Integration
// ============================================================================

/// JSON body extractor whose rejections use the API error envelope.
///
/// A missing field becomes `missing_field`; anything else malformed becomes
/// `invalid_request`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(ApiError::from(map_rejection(&rejection))),
        }
    }
}

fn map_rejection(rejection: &JsonRejection) -> WalletError {
    let text = rejection.body_text();
    match missing_field_name(&text) {
        Some(field) => WalletError::MissingField(field),
        None => WalletError::InvalidRequest(text),
    }
}

/// Pull `x` out of serde's "missing field `x`" message
fn missing_field_name(text: &str) -> Option<String> {
    let rest = &text[text.find("missing field `")? + "missing field `".len()..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

// ============================================================================
// KYC
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitKycRequest {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub country: Option<String>,
}

impl From<SubmitKycRequest> for KycApplication {
    fn from(r: SubmitKycRequest) -> Self {
        Self {
            document_type: r.document_type,
            document_number: r.document_number,
            full_name: r.full_name,
            date_of_birth: r.date_of_birth,
            country: r.country,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycWebhookDecision {
    Verified,
    Rejected,
}

/// Provider callback or manual reviewer decision
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KycWebhookRequest {
    #[serde(rename = "kycID")]
    pub kyc_id: KycId,
    pub decision: KycWebhookDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

impl KycWebhookRequest {
    pub fn decision(&self) -> ReviewDecision {
        match self.decision {
            KycWebhookDecision::Verified => ReviewDecision::Approve,
            KycWebhookDecision::Rejected => ReviewDecision::Reject {
                reason: self
                    .reason
                    .clone()
                    .unwrap_or_else(|| "rejected by reviewer".to_string()),
            },
        }
    }
}

// ============================================================================
// Wallets
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateWalletRequest {
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TopUpApiRequest {
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
}

impl From<TopUpApiRequest> for TopUpRequest {
    fn from(r: TopUpApiRequest) -> Self {
        Self {
            wallet_id: r.wallet_id,
            amount: r.amount,
            currency: r.currency,
            payment_method: r.payment_method,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferApiRequest {
    #[serde(rename = "fromWalletID")]
    pub from_wallet_id: WalletId,
    #[serde(rename = "toWalletID")]
    pub to_wallet_id: WalletId,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

impl From<TransferApiRequest> for TransferRequest {
    fn from(r: TransferApiRequest) -> Self {
        Self {
            from_wallet_id: r.from_wallet_id,
            to_wallet_id: r.to_wallet_id,
            amount: r.amount,
        }
    }
}

// ============================================================================
// Payment webhook
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentWebhookStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentWebhookRequest {
    #[serde(rename = "referenceID")]
    pub reference_id: ReferenceId,
    pub status: PaymentWebhookStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PaymentWebhookRequest {
    pub fn outcome(&self) -> SettlementOutcome {
        match self.status {
            PaymentWebhookStatus::Completed => SettlementOutcome::Completed,
            PaymentWebhookStatus::Failed => SettlementOutcome::Failed {
                reason: self
                    .reason
                    .clone()
                    .unwrap_or_else(|| "payment failed".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_name() {
        assert_eq!(
            missing_field_name("Failed to deserialize the JSON body into the target type: missing field `amount` at line 1 column 20"),
            Some("amount".to_string())
        );
        assert_eq!(missing_field_name("expected value at line 1"), None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = serde_json::from_str::<CreateWalletRequest>(
            r#"{"currency": "THB", "balance": "1000000"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_topup_request_accepts_string_or_number_amount() {
        let id = WalletId::new();
        let body = format!(
            r#"{{"walletID": "{}", "amount": "5000.00", "currency": "THB", "paymentMethod": "bank_transfer"}}"#,
            id
        );
        let req: TopUpApiRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.wallet_id, id);
        assert_eq!(req.amount, Decimal::from(5000));

        let body = format!(
            r#"{{"walletID": "{}", "amount": 12.5, "currency": "THB", "paymentMethod": "card"}}"#,
            id
        );
        let req: TopUpApiRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.amount, Decimal::new(125, 1));
    }

    #[test]
    fn test_webhook_outcomes() {
        let req: PaymentWebhookRequest = serde_json::from_str(&format!(
            r#"{{"referenceID": "{}", "status": "failed"}}"#,
            ReferenceId::new()
        ))
        .unwrap();
        assert_eq!(
            req.outcome(),
            SettlementOutcome::Failed {
                reason: "payment failed".into()
            }
        );

        let req: KycWebhookRequest = serde_json::from_str(&format!(
            r#"{{"kycID": "{}", "decision": "verified"}}"#,
            KycId::new()
        ))
        .unwrap();
        assert_eq!(req.decision(), ReviewDecision::Approve);
    }
}
