//! Wallet handlers

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
};

use super::super::middleware::AuthenticatedUser;
use super::super::state::AppState;
use super::super::types::{
    ApiResult, BalanceResponse, CreateWalletRequest, HistoryResponse, TransactionResponse,
    ValidatedJson, WalletResponse, created, ok,
};
use super::parse_wallet_id;
use crate::error::WalletError;

/// Create wallet
///
/// POST /api/v1/wallets
pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<CreateWalletRequest>,
) -> ApiResult<WalletResponse> {
    let currency = req
        .currency
        .ok_or_else(|| WalletError::MissingField("currency".into()))?;
    let wallet = state.wallets.create_wallet(&user.user_id, &currency)?;
    created(wallet.into())
}

/// Caller's wallets
///
/// GET /api/v1/wallets
pub async fn list_wallets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<WalletResponse>> {
    let wallets = state
        .wallets
        .list_wallets(&user.user_id)
        .into_iter()
        .map(WalletResponse::from)
        .collect();
    ok(wallets)
}

/// GET /api/v1/wallets/{walletID}
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<WalletResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    let wallet = state.wallets.get_wallet(wallet_id, &user.user_id)?;
    ok(wallet.into())
}

/// GET /api/v1/wallets/{walletID}/balance
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<BalanceResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    let balance = state.wallets.get_balance(wallet_id, &user.user_id)?;
    ok(balance.into())
}

/// Oldest first
///
/// GET /api/v1/wallets/{walletID}/transactions
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<HistoryResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    let transactions: Vec<TransactionResponse> = state
        .coordinator
        .history(wallet_id, &user.user_id)?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();
    ok(HistoryResponse {
        wallet_id,
        total: transactions.len(),
        transactions,
    })
}

/// POST /api/v1/wallets/{walletID}/freeze
pub async fn freeze_wallet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<WalletResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    ok(state.wallets.freeze(wallet_id, &user.user_id)?.into())
}

/// POST /api/v1/wallets/{walletID}/unfreeze
pub async fn unfreeze_wallet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<WalletResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    ok(state.wallets.unfreeze(wallet_id, &user.user_id)?.into())
}

/// POST /api/v1/wallets/{walletID}/close
pub async fn close_wallet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(wallet_id): Path<String>,
) -> ApiResult<WalletResponse> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    ok(state.wallets.close(wallet_id, &user.user_id)?.into())
}
