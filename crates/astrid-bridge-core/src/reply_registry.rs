//! Reply-Address Registry (component 4.B): a TTL-evicted whitelist of
//! ephemeral addresses the client is allowed to address an inbound frame to
//! without matching the normal permission list.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

/// Default reply-address lifetime (30s, matching the reference bridge; not
/// configurable there either).
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Whitelists reply addresses for `replyTimeout`, evicting whichever happens
/// first: explicit [`consume`](Self::consume) or timer expiry.
///
/// Entries carry a generation counter so that a timer scheduled for an
/// earlier `add` cannot evict a later `add` of the same address (re-adding
/// an address that is mid-flight extends its lifetime rather than racing
/// with the stale timer).
pub struct ReplyAddressRegistry {
    entries: Arc<DashMap<String, u64>>,
    timeout: Duration,
}

impl ReplyAddressRegistry {
    /// Build a registry with the given per-entry lifetime.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Whitelist `address`, scheduling its eviction after the configured
    /// timeout unless it is consumed first.
    pub fn add(&self, address: String) {
        let generation = {
            let mut entry = self.entries.entry(address.clone()).or_insert(0);
            *entry = entry.saturating_add(1);
            *entry
        };

        let entries = Arc::clone(&self.entries);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            // Only remove if no later `add` bumped the generation — an
            // intervening `consume` already removed the key, so `remove_if`
            // is a no-op in that case too.
            entries.remove_if(&address, |_, gen| *gen == generation);
            debug!(%address, "reply address expired");
        });
    }

    /// Return `true` and remove `address` if it is currently whitelisted.
    /// A second call for the same address (or a timer firing afterwards)
    /// is a harmless no-op.
    pub fn consume(&self, address: &str) -> bool {
        self.entries.remove(address).is_some()
    }
}
