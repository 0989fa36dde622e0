//! Subscription identifiers.

use crate::error::{ConfigError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter, so ids never repeat even across registries.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token identifying one subscription.
///
/// Returned by [`SubscriberRegistry::subscribe`](super::SubscriberRegistry::subscribe)
/// and required to unsubscribe. Ids are unique for the lifetime of the process
/// and carry no ordering meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Mint a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IdSpaceExhausted`] once the counter has reached
    /// `u64::MAX`.
    pub(crate) fn mint() -> Result<Self> {
        Self::mint_from(&NEXT_ID)
    }

    fn mint_from(counter: &AtomicU64) -> Result<Self> {
        counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map(Self)
            .map_err(|_| ConfigError::IdSpaceExhausted)
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{:016x}", self.0)
    }
}
