//! # Decision Cache
//!
//! Memoizes evaluation verdicts for a bounded time window so that
//! replaying many contexts against many nodes does not re-evaluate
//! identical (expression, context) pairs.
//!
//! The cache is scoped to one simulation invocation — never shared across
//! calls or processes — so no locking is needed: there is no concurrent
//! mutation within a call. Entries are valid for 60 000 ms from insertion;
//! older reads are treated as misses. Reads take an explicit `now` so
//! expiry is testable without sleeping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use poe_core::{PolicyContextSpec, Verdict};

/// How long a cached verdict stays valid after insertion.
pub const DECISION_TTL: Duration = Duration::from_millis(60_000);

/// Field separator fed into the fingerprint hash between components.
const FINGERPRINT_SEPARATOR: [u8; 1] = [0x1f];

// ---------------------------------------------------------------------------
// CacheFingerprint
// ---------------------------------------------------------------------------

/// Composite key memoizing one (expression, context) pair.
///
/// SHA-256 over the expression text, principal, resource, action, and the
/// key-sorted JSON serialization of the attribute bag. Two contexts with
/// the same fields always produce the same fingerprint; the separator byte
/// prevents field-boundary collisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheFingerprint(String);

impl CacheFingerprint {
    /// Compute the fingerprint for an expression evaluated in a context.
    pub fn compute(expression: &str, context: &PolicyContextSpec) -> Self {
        // BTreeMap serialization is key-sorted, so this is deterministic.
        let attributes = serde_json::to_string(&context.attributes).unwrap_or_default();

        let mut hasher = Sha256::new();
        for part in [
            expression,
            &context.principal,
            &context.resource,
            &context.action,
            &attributes,
        ] {
            hasher.update(part.as_bytes());
            hasher.update(FINGERPRINT_SEPARATOR);
        }

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// The hex digest backing this fingerprint.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// DecisionCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    verdict: Verdict,
    inserted_at: Instant,
}

/// Verdict memoization for one simulation invocation.
#[derive(Debug, Default)]
pub struct DecisionCache {
    entries: HashMap<CacheFingerprint, CacheEntry>,
}

impl DecisionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a verdict if an entry exists and is younger than
    /// [`DECISION_TTL`] at `now`.
    pub fn lookup(&self, fingerprint: &CacheFingerprint, now: Instant) -> Option<Verdict> {
        self.entries.get(fingerprint).and_then(|entry| {
            if now.saturating_duration_since(entry.inserted_at) < DECISION_TTL {
                Some(entry.verdict)
            } else {
                None
            }
        })
    }

    /// Store a verdict, stamping it with `now`. Replaces any prior entry.
    pub fn insert(&mut self, fingerprint: CacheFingerprint, verdict: Verdict, now: Instant) {
        self.entries.insert(
            fingerprint,
            CacheEntry {
                verdict,
                inserted_at: now,
            },
        );
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
