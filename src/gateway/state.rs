use std::sync::Arc;

use crate::config::{KycConfig, ResilienceConfig};
use crate::external::SimulatedDependencies;
use crate::kyc::KycGate;
use crate::resilience::{
    BreakerRegistry, NotificationDispatcher, ResilientKycVerifier, ResilientPaymentGateway,
    dependency,
};
use crate::transfer::TransferCoordinator;
use crate::wallet::WalletRegistry;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// KYC submissions and reviewer decisions
    pub kyc: Arc<KycGate>,
    /// Wallet lifecycle and per-wallet locks
    pub wallets: Arc<WalletRegistry>,
    /// Top-ups, transfers and settlement
    pub coordinator: Arc<TransferCoordinator>,
    /// One circuit breaker per external dependency
    pub breakers: Arc<BreakerRegistry>,
    /// In-process dependency implementations (fault injection handles)
    pub simulated: SimulatedDependencies,
    /// Shared secret for provider callbacks and internal routes; empty
    /// rejects every such call
    pub service_secret: Arc<str>,
}

impl AppState {
    /// Wire every component against the simulated dependencies
    pub fn new(
        kyc_config: &KycConfig,
        resilience: &ResilienceConfig,
        simulated: SimulatedDependencies,
    ) -> Self {
        let breakers = Arc::new(BreakerRegistry::new(resilience.breaker()));

        let verifier = ResilientKycVerifier::new(
            simulated.kyc.clone(),
            breakers.breaker(dependency::KYC_PROVIDER),
            kyc_config.manual_review_sla(),
        );
        let kyc = Arc::new(KycGate::new(
            kyc_config.supported_countries.iter(),
            verifier,
        ));

        let wallets = Arc::new(WalletRegistry::new(kyc.clone()));

        let payments = ResilientPaymentGateway::new(
            simulated.payment.clone(),
            breakers.breaker(dependency::PAYMENT_GATEWAY),
            resilience.retry_after(),
        );
        let notifier = Arc::new(NotificationDispatcher::new(
            simulated.sms.clone(),
            breakers.breaker(dependency::SMS),
            simulated.email.clone(),
            breakers.breaker(dependency::EMAIL),
        ));
        let coordinator = Arc::new(TransferCoordinator::new(
            wallets.clone(),
            payments,
            notifier,
        ));

        Self {
            kyc,
            wallets,
            coordinator,
            breakers,
            simulated,
            service_secret: Arc::from(""),
        }
    }

    pub fn with_service_secret(mut self, secret: impl Into<String>) -> Self {
        self.service_secret = Arc::from(secret.into());
        self
    }

    /// Default KYC and resilience settings
    pub fn with_defaults() -> Self {
        Self::new(
            &KycConfig::default(),
            &ResilienceConfig::default(),
            SimulatedDependencies::new(),
        )
    }
}
