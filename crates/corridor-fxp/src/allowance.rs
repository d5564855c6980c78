//! Background allowance top-up.
//!
//! Lock creation draws on the wallet's allowance toward the lock
//! contract; this task keeps the allowance near the configured target so
//! setups do not stall on an extra approval transaction.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::FxpError;
use crate::service::FxProvider;

/// Default top-up check interval.
pub const ALLOWANCE_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub fn spawn_allowance_task(provider: Arc<FxProvider>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = provider.top_up_allowance().await {
                tracing::warn!(error = %e, "allowance top-up failed");
            }
        }
    })
}

impl FxProvider {
    /// Restore the allowance toward the target when it has fallen below
    /// half of it.
    pub async fn top_up_allowance(&self) -> Result<(), FxpError> {
        let target = self.settings().target_allowance;
        let current = self.ledger().allowance().await?;
        if current < target / 2 {
            let delta = target - current;
            self.ledger().increase_allowance(delta).await?;
            tracing::info!(current, delta, "allowance topped up");
        } else {
            tracing::debug!(current, "allowance sufficient, no top-up needed");
        }
        Ok(())
    }
}
