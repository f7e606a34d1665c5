//! Auth Cache (component 4.C): caches sessionID → auth metadata with a
//! per-entry TTL timer, and the inverse socket → sessionIDs index used to
//! cancel everything a closing socket owns.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::transport::SocketId;

/// A cached authorisation: the session id, the socket that earned it, and
/// the opaque metadata the auth authority returned.
#[derive(Debug, Clone)]
pub struct Auth {
    /// The client-supplied session identifier this auth was granted to.
    pub session_id: String,
    /// The socket this authorisation belongs to.
    pub socket: SocketId,
    /// Opaque metadata returned by the auth authority.
    pub metadata: Value,
}

struct Entry {
    auth: Auth,
    timer: JoinHandle<()>,
}

/// Caches authorisations for `authTimeout`, evicting on timer expiry or
/// explicit socket-close cancellation — whichever comes first.
///
/// `entries` and `sock_auths` are independent `DashMap`s rather than one
/// table keyed by `(socket, sessionID)`: splitting them means the common
/// `get(sessionID)` lookup on every auth-requiring frame never has to scan
/// per-socket sets, at the cost of keeping invariant 1 (`entries[sid].socket
/// == s ⇔ sid ∈ sock_auths[s]`) true by hand in every method below.
pub struct AuthCache {
    entries: Arc<DashMap<String, Entry>>,
    sock_auths: Arc<DashMap<SocketId, HashSet<String>>>,
    timeout: Duration,
}

impl AuthCache {
    /// Build a cache with the given per-entry TTL. `timeout` of zero is
    /// valid — the entry is evicted on the next scheduler tick.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sock_auths: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Cache `metadata` for `session_id`, owned by `socket`, and arm its
    /// eviction timer. Replaces any prior entry for the same session id,
    /// cancelling its timer first so two timers never race over one slot.
    pub fn put(&self, session_id: String, socket: SocketId, metadata: Value) {
        if let Some((_, old)) = self.entries.remove(&session_id) {
            old.timer.abort();
            if let Some(mut sids) = self.sock_auths.get_mut(&old.auth.socket) {
                sids.remove(&session_id);
            }
        }

        self.sock_auths
            .entry(socket)
            .or_default()
            .insert(session_id.clone());

        let entries = Arc::clone(&self.entries);
        let sock_auths = Arc::clone(&self.sock_auths);
        let timeout = self.timeout;
        let timer_session_id = session_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            Self::evict_inner(&entries, &sock_auths, &timer_session_id, socket);
            debug!(session_id = %timer_session_id, "auth cache entry expired");
        });

        self.entries.insert(
            session_id.clone(),
            Entry {
                auth: Auth {
                    session_id,
                    socket,
                    metadata,
                },
                timer,
            },
        );
    }

    /// Look up a cached authorisation.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<Auth> {
        self.entries.get(session_id).map(|e| e.auth.clone())
    }

    /// Every cached auth currently owned by `socket`, used by the outbound
    /// filter to build the metadata set it passes to `applySendAuthRules`.
    #[must_use]
    pub fn auths_for_socket(&self, socket: SocketId) -> Vec<Auth> {
        let Some(sids) = self.sock_auths.get(&socket) else {
            return Vec::new();
        };
        sids.iter()
            .filter_map(|sid| self.entries.get(sid).map(|e| e.auth.clone()))
            .collect()
    }

    /// Whether `socket` currently owns at least one cached authorisation.
    #[must_use]
    pub fn has_any_for_socket(&self, socket: SocketId) -> bool {
        self.sock_auths.get(&socket).is_some_and(|s| !s.is_empty())
    }

    /// Evict `session_id` immediately, cancelling its timer.
    pub fn evict(&self, session_id: &str, socket: SocketId) {
        if let Some((_, entry)) = self.entries.remove(session_id) {
            entry.timer.abort();
        }
        if let Some(mut sids) = self.sock_auths.get_mut(&socket) {
            sids.remove(session_id);
            if sids.is_empty() {
                drop(sids);
                self.sock_auths.remove(&socket);
            }
        }
    }

    fn evict_inner(
        entries: &DashMap<String, Entry>,
        sock_auths: &DashMap<SocketId, HashSet<String>>,
        session_id: &str,
        socket: SocketId,
    ) {
        entries.remove(session_id);
        if let Some(mut sids) = sock_auths.get_mut(&socket) {
            sids.remove(session_id);
            if sids.is_empty() {
                drop(sids);
                sock_auths.remove(&socket);
            }
        }
    }

    /// Cancel every authorisation `socket` owns: aborts each entry's timer,
    /// removes it from `entries`, then drops the socket's index row.
    /// Called once from session teardown — invariant 2.
    pub fn cancel_all_for(&self, socket: SocketId) {
        let Some((_, sids)) = self.sock_auths.remove(&socket) else {
            return;
        };
        for sid in sids {
            if let Some((_, entry)) = self.entries.remove(&sid) {
                entry.timer.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get() {
        let cache = AuthCache::new(Duration::from_secs(300));
        let sock = SocketId::new();
        cache.put("s1".to_string(), sock, json!({"role": "admin"}));
        let auth = cache.get("s1").unwrap();
        assert_eq!(auth.session_id, "s1");
        assert_eq!(auth.socket, sock);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_removes_entry_and_index() {
        let cache = AuthCache::new(Duration::from_millis(50));
        let sock = SocketId::new();
        cache.put("s1".to_string(), sock, json!({}));
        assert!(cache.has_any_for_socket(sock));

        tokio::time::advance(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;

        assert!(cache.get("s1").is_none());
        assert!(!cache.has_any_for_socket(sock));
    }

    #[tokio::test]
    async fn cancel_all_for_socket_cleans_everything() {
        let cache = AuthCache::new(Duration::from_secs(300));
        let sock = SocketId::new();
        cache.put("s1".to_string(), sock, json!({}));
        cache.put("s2".to_string(), sock, json!({}));

        cache.cancel_all_for(sock);

        assert!(cache.get("s1").is_none());
        assert!(cache.get("s2").is_none());
        assert!(!cache.has_any_for_socket(sock));
    }

    #[tokio::test]
    async fn replacing_an_entry_cancels_the_old_timer() {
        let cache = AuthCache::new(Duration::from_secs(300));
        let sock_a = SocketId::new();
        let sock_b = SocketId::new();
        cache.put("s1".to_string(), sock_a, json!({"v": 1}));
        cache.put("s1".to_string(), sock_b, json!({"v": 2}));

        assert!(!cache.has_any_for_socket(sock_a));
        let auth = cache.get("s1").unwrap();
        assert_eq!(auth.socket, sock_b);
    }
}
