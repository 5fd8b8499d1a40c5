use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::breaker::{CallOutcome, CircuitBreaker};
use crate::error::{WalletError, WalletResult};
use crate::external::{Notification, NotificationChannel};

/// Channel that actually delivered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Primary,
    Fallback,
}

struct GuardedChannel {
    channel: Arc<dyn NotificationChannel>,
    breaker: Arc<CircuitBreaker>,
}

impl GuardedChannel {
    async fn send(&self, notification: &Notification) -> bool {
        match self.breaker.call(self.channel.send(notification)).await {
            CallOutcome::Completed(()) => true,
            outcome => {
                debug!(channel = self.channel.name(), ?outcome, "notification not delivered");
                false
            }
        }
    }
}

/// SMS first, email when SMS is down
pub struct NotificationDispatcher {
    primary: GuardedChannel,
    fallback: GuardedChannel,
}

impl NotificationDispatcher {
    pub fn new(
        primary: Arc<dyn NotificationChannel>,
        primary_breaker: Arc<CircuitBreaker>,
        fallback: Arc<dyn NotificationChannel>,
        fallback_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            primary: GuardedChannel {
                channel: primary,
                breaker: primary_breaker,
            },
            fallback: GuardedChannel {
                channel: fallback,
                breaker: fallback_breaker,
            },
        }
    }

    /// # Errors
    /// `AllNotificationServicesUnavailable` when neither channel delivered.
    pub async fn send(&self, notification: &Notification) -> WalletResult<DeliveryChannel> {
        if self.primary.send(notification).await {
            return Ok(DeliveryChannel::Primary);
        }
        warn!(
            user_id = %notification.user_id,
            primary = self.primary.channel.name(),
            fallback = self.fallback.channel.name(),
            "primary notification channel failed, falling back"
        );
        if self.fallback.send(notification).await {
            return Ok(DeliveryChannel::Fallback);
        }
        Err(WalletError::AllNotificationServicesUnavailable)
    }
}
