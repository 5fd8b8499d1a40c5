use std::sync::Arc;

use rust_decimal::Decimal;

use wallet_ledger::gateway::AppState;
use wallet_ledger::kyc::{KycApplication, KycStatus};
use wallet_ledger::ledger::{TransactionStatus, TransactionType};
use wallet_ledger::transfer::{TopUpRequest, TopUpStatus, TransferRequest};
use wallet_ledger::{WalletError, WalletId};

fn application(country: &str) -> KycApplication {
    KycApplication {
        document_type: Some("national_id".into()),
        document_number: Some("1103700012345".into()),
        full_name: Some("Somchai Jaidee".into()),
        date_of_birth: Some("1990-04-12".into()),
        country: Some(country.into()),
    }
}

/// KYC-verify `user` and open a THB wallet
async fn onboard(state: &AppState, user: &str) -> WalletId {
    let record = state.kyc.submit(user, application("TH")).await.unwrap();
    assert_eq!(record.status, KycStatus::Verified);
    state.wallets.create_wallet(user, "THB").unwrap().id
}

fn top_up(wallet_id: WalletId, amount: i64) -> TopUpRequest {
    TopUpRequest {
        wallet_id,
        amount: Decimal::from(amount),
        currency: "THB".into(),
        payment_method: "bank_transfer".into(),
    }
}

fn transfer(from: WalletId, to: WalletId, amount: Decimal) -> TransferRequest {
    TransferRequest {
        from_wallet_id: from,
        to_wallet_id: to,
        amount,
    }
}

#[tokio::test]
async fn thai_user_tops_up_and_pays_a_friend() {
    let state = AppState::with_defaults();
    let alice = onboard(&state, "alice").await;
    let bob = onboard(&state, "bob").await;

    let receipt = state
        .coordinator
        .top_up("alice", top_up(alice, 5000))
        .await
        .unwrap();
    assert_eq!(receipt.status, TopUpStatus::Completed);
    assert_eq!(receipt.fee, Decimal::from(5));
    assert_eq!(
        state.wallets.get_balance(alice, "alice").unwrap().total,
        Decimal::from(5000)
    );

    let receipt = state
        .coordinator
        .transfer("alice", transfer(alice, bob, Decimal::from(1000)))
        .await
        .unwrap();
    assert_eq!(receipt.status, TransactionStatus::Completed);
    assert_eq!(receipt.fee, Decimal::from(5));
    assert_eq!(receipt.source_new_balance.total, Decimal::from(3995));
    assert_eq!(receipt.dest_new_balance.total, Decimal::from(1000));

    let history = state.coordinator.history(alice, "alice").unwrap();
    let types: Vec<_> = history.iter().map(|t| t.tx_type).collect();
    assert_eq!(types, vec![TransactionType::TopUp, TransactionType::TransferOut]);

    let history = state.coordinator.history(bob, "bob").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_type, TransactionType::TransferIn);
    assert_eq!(history[0].counterparty_wallet_id, Some(alice));
    assert_eq!(history[0].fee, Decimal::ZERO);
}

#[tokio::test]
async fn unverified_user_cannot_open_a_wallet() {
    let state = AppState::with_defaults();
    assert_eq!(
        state.wallets.create_wallet("mallory", "THB").unwrap_err(),
        WalletError::KycRequired
    );
}

#[tokio::test]
async fn insufficient_balance_leaves_both_wallets_untouched() {
    let state = AppState::with_defaults();
    let alice = onboard(&state, "alice").await;
    let bob = onboard(&state, "bob").await;
    state
        .coordinator
        .top_up("alice", top_up(alice, 1000))
        .await
        .unwrap();

    // 1000 + 5 fee > 1000
    let err = state
        .coordinator
        .transfer("alice", transfer(alice, bob, Decimal::from(1000)))
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::InsufficientBalance);

    assert_eq!(
        state.wallets.get_balance(alice, "alice").unwrap().available,
        Decimal::from(1000)
    );
    assert_eq!(
        state.wallets.get_balance(bob, "bob").unwrap().total,
        Decimal::ZERO
    );
    assert_eq!(state.coordinator.history(alice, "alice").unwrap().len(), 1);
    assert!(state.coordinator.history(bob, "bob").unwrap().is_empty());
}

#[tokio::test]
async fn stranger_cannot_read_or_spend_a_wallet() {
    let state = AppState::with_defaults();
    let alice = onboard(&state, "alice").await;
    let bob = onboard(&state, "bob").await;

    assert!(matches!(
        state.wallets.get_balance(alice, "bob"),
        Err(WalletError::WalletAccessDenied(_))
    ));
    assert!(matches!(
        state
            .coordinator
            .transfer("bob", transfer(alice, bob, Decimal::ONE))
            .await,
        Err(WalletError::WalletAccessDenied(_))
    ));
    assert!(matches!(
        state.wallets.get_balance(WalletId::new(), "alice"),
        Err(WalletError::WalletNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_opposite_transfers_conserve_money() {
    let state = Arc::new(AppState::with_defaults());
    let alice = onboard(&state, "alice").await;
    let bob = onboard(&state, "bob").await;
    for (user, wallet) in [("alice", alice), ("bob", bob)] {
        state
            .coordinator
            .top_up(user, top_up(wallet, 5000))
            .await
            .unwrap();
    }

    let mut tasks = Vec::new();
    for i in 0..200 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let (user, from, to) = if i % 2 == 0 {
                ("alice", alice, bob)
            } else {
                ("bob", bob, alice)
            };
            state
                .coordinator
                .transfer(user, transfer(from, to, Decimal::from(10)))
                .await
        }));
    }

    let mut fees = Decimal::ZERO;
    for task in tasks {
        let receipt = task.await.unwrap().unwrap();
        fees += receipt.fee;
    }

    let a = state.wallets.get_balance(alice, "alice").unwrap();
    let b = state.wallets.get_balance(bob, "bob").unwrap();
    assert_eq!(a.total + b.total + fees, Decimal::from(10000));
    assert_eq!(fees, Decimal::new(5, 2) * Decimal::from(200));
}
