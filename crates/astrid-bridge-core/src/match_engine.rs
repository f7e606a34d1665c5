//! Declarative pattern-match permission engine (component 4.A).

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};
use crate::frame::{Direction, PermissionRule};
use crate::reply_registry::ReplyAddressRegistry;

/// Result of matching one `(direction, address, body)` triple against a
/// permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Whether a rule (or the reply fast-path) matched.
    pub does_match: bool,
    /// Whether the matched rule requires authorisation.
    pub requires_auth: bool,
}

impl Match {
    const NONE: Self = Self {
        does_match: false,
        requires_auth: false,
    };

    const fn matched(requires_auth: bool) -> Self {
        Self {
            does_match: true,
            requires_auth,
        }
    }
}

/// Compiles and memoises `address_re` patterns, and evaluates the inbound and
/// outbound permission lists.
///
/// Pure and safe for concurrent reads — the only mutation is a write-on-miss
/// into the regex cache, guarded by `DashMap`'s internal sharded locking.
pub struct MatchEngine {
    inbound: Vec<PermissionRule>,
    outbound: Vec<PermissionRule>,
    compiled_res: DashMap<String, Regex>,
}

impl MatchEngine {
    /// Build an engine from the two configured permission lists.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidPattern`] if any `address_re` fails to
    /// compile. Rules are immutable after construction, so compiling eagerly
    /// here means `evaluate` never has to surface a compile error.
    pub fn new(inbound: Vec<PermissionRule>, outbound: Vec<PermissionRule>) -> BridgeResult<Self> {
        let compiled_res = DashMap::new();
        for rule in inbound.iter().chain(outbound.iter()) {
            if let Some(pattern) = &rule.address_re {
                Self::compile(&compiled_res, pattern)?;
            }
        }
        Ok(Self {
            inbound,
            outbound,
            compiled_res,
        })
    }

    fn compile(cache: &DashMap<String, Regex>, pattern: &str) -> BridgeResult<Regex> {
        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            BridgeError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        cache.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    /// Evaluate `(direction, address, body)` against the configured rules.
    ///
    /// For inbound traffic, first consults the reply-address fast-path: an
    /// address that was whitelisted for a pending reply always matches and
    /// is consumed (removed) regardless of what the permission list says.
    pub fn evaluate(
        &self,
        direction: Direction,
        address: &str,
        body: Option<&Value>,
        reply_addresses: &ReplyAddressRegistry,
    ) -> Match {
        if direction == Direction::Inbound && reply_addresses.consume(address) {
            trace!(%address, "reply fast-path matched");
            return Match::matched(false);
        }

        let list = match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        };

        for rule in list {
            if !self.address_matches(rule, address) {
                continue;
            }
            if !Self::body_matches(rule, body) {
                continue;
            }
            return Match::matched(rule.requires_auth);
        }
        Match::NONE
    }

    fn address_matches(&self, rule: &PermissionRule, address: &str) -> bool {
        if let Some(literal) = &rule.address {
            return literal == address;
        }
        if let Some(pattern) = &rule.address_re {
            // Constructor already validated and warmed the cache; this only
            // misses if a rule set was mutated after construction, which the
            // API does not allow.
            return Self::compile(&self.compiled_res, pattern)
                .map(|re| re.is_match(address))
                .unwrap_or(false);
        }
        true
    }

    /// Body constraints only apply when the body is a JSON object; any other
    /// shape (array, scalar, null, or absent) bypasses the constraint
    /// entirely — this is intentional, not a failure to match.
    fn body_matches(rule: &PermissionRule, body: Option<&Value>) -> bool {
        let Some(fields) = &rule.r#match else {
            return true;
        };
        let Some(Value::Object(obj)) = body else {
            return true;
        };
        fields.iter().all(|(k, v)| obj.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ReplyAddressRegistry {
        ReplyAddressRegistry::new(std::time::Duration::from_secs(30))
    }

    #[test]
    fn reject_all_by_default() {
        let engine = MatchEngine::new(vec![], vec![]).unwrap();
        let m = engine.evaluate(Direction::Inbound, "foo", None, &registry());
        assert!(!m.does_match);
    }

    #[test]
    fn literal_address_matches() {
        let engine = MatchEngine::new(vec![PermissionRule::on_address("foo")], vec![]).unwrap();
        let m = engine.evaluate(Direction::Inbound, "foo", None, &registry());
        assert!(m.does_match);
        assert!(!m.requires_auth);
    }

    #[test]
    fn first_match_wins() {
        let rules = vec![
            PermissionRule::on_address("foo"),
            PermissionRule::on_address("foo").requiring_auth(),
        ];
        let engine = MatchEngine::new(rules, vec![]).unwrap();
        let m = engine.evaluate(Direction::Inbound, "foo", None, &registry());
        assert!(m.does_match);
        assert!(!m.requires_auth, "earlier rule's requires_auth should win");
    }

    #[test]
    fn body_constraint_mismatch_drops() {
        let mut fields = std::collections::HashMap::new();
        fields.insert("x".to_string(), json!(1));
        let rule = PermissionRule::on_address("foo").matching(fields);
        let engine = MatchEngine::new(vec![rule], vec![]).unwrap();

        let body = json!({"x": 2});
        let m = engine.evaluate(Direction::Inbound, "foo", Some(&body), &registry());
        assert!(!m.does_match);
    }

    #[test]
    fn non_object_body_bypasses_match_constraint() {
        let mut fields = std::collections::HashMap::new();
        fields.insert("x".to_string(), json!(1));
        let rule = PermissionRule::on_address("foo").matching(fields);
        let engine = MatchEngine::new(vec![rule], vec![]).unwrap();

        let body = json!([1, 2, 3]);
        let m = engine.evaluate(Direction::Inbound, "foo", Some(&body), &registry());
        assert!(m.does_match);
    }

    #[test]
    fn address_re_full_match() {
        let rule = PermissionRule {
            address: None,
            address_re: Some("chat\\..*".to_string()),
            r#match: None,
            requires_auth: false,
        };
        let engine = MatchEngine::new(vec![rule], vec![]).unwrap();
        assert!(
            engine
                .evaluate(Direction::Inbound, "chat.room1", None, &registry())
                .does_match
        );
        assert!(
            !engine
                .evaluate(Direction::Inbound, "nope", None, &registry())
                .does_match
        );
    }

    #[test]
    fn reply_fast_path_consumes_entry() {
        let engine = MatchEngine::new(vec![], vec![]).unwrap();
        let reg = registry();
        reg.add("reply.1".to_string());

        let first = engine.evaluate(Direction::Inbound, "reply.1", None, &reg);
        assert!(first.does_match);
        assert!(!first.requires_auth);

        // Second hit subject to normal (empty, reject-all) rules.
        let second = engine.evaluate(Direction::Inbound, "reply.1", None, &reg);
        assert!(!second.does_match);
    }

    #[test]
    fn invalid_pattern_rejected_at_construction() {
        let rule = PermissionRule {
            address: None,
            address_re: Some("(unclosed".to_string()),
            r#match: None,
            requires_auth: false,
        };
        let err = MatchEngine::new(vec![rule], vec![]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPattern { .. }));
    }
}
