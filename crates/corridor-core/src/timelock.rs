//! Timelock cascade computation.
//!
//! Every lock in a route shares the same hashlock but carries a strictly
//! decreasing timelock from sender to recipient: each hop closer to the
//! sender expires one safety margin later than the hop below it, so that
//! once the recipient reveals the secret, every upstream hop still has
//! positive time to claim before its own lock becomes refundable.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Observed upper bound on per-hop processing time.
pub const HOP_PROCESSING_DELAY: Duration = Duration::from_secs(60);

/// Observed upper bound on per-hop network delivery time.
pub const HOP_NETWORK_DELAY: Duration = Duration::from_secs(5);

/// The per-hop safety margin applied by the timelock cascade.
///
/// Whether the empirical default is sufficient under load is an open
/// operational question, so the margin is carried as policy state rather
/// than read from the constants directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelockPolicy {
    pub hop_margin: Duration,
}

impl Default for TimelockPolicy {
    fn default() -> Self {
        Self {
            hop_margin: HOP_PROCESSING_DELAY + HOP_NETWORK_DELAY,
        }
    }
}

impl TimelockPolicy {
    pub fn new(hop_margin: Duration) -> Self {
        Self { hop_margin }
    }

    /// Absolute expiry (epoch seconds) for a lock created now.
    ///
    /// `hops_upstream` counts the hops between this lock and the route's
    /// final lock: the recipient-side lock uses the base duration, the
    /// intermediate lock adds one margin, the sender's reference lock adds
    /// one margin per hop below it.
    pub fn expiry(&self, base: Duration, hops_upstream: u32) -> i64 {
        self.expiry_at(Utc::now(), base, hops_upstream)
    }

    /// As [`expiry`](Self::expiry) with an explicit clock, for tests.
    pub fn expiry_at(&self, now: DateTime<Utc>, base: Duration, hops_upstream: u32) -> i64 {
        let margin = self.hop_margin.as_secs() as i64 * hops_upstream as i64;
        now.timestamp() + base.as_secs() as i64 + margin
    }
}
