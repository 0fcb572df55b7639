//! # Expression Engine Seam
//!
//! The policy-expression language is an external collaborator: this engine
//! never parses or interprets expression text itself. The simulator calls
//! exactly two opaque operations — parse a raw expression into an
//! evaluable handle, and evaluate handles against a request context for a
//! final allow/deny verdict.
//!
//! ## Failure philosophy
//!
//! Parse failures are fail-fast: [`ExpressionError`] propagates uncaught
//! through the simulator to the caller. This is the deliberate counterpart
//! to the planner, which degrades gracefully and never errors. Bad policy
//! input must not be silently swallowed during execution simulation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::context::{PolicyContextSpec, Verdict};

/// Failure to turn raw expression text into an evaluable handle.
#[derive(Debug, Clone, Error)]
pub enum ExpressionError {
    /// The expression text could not be parsed.
    #[error("malformed policy expression {snippet:?}: {reason}")]
    Malformed {
        /// A truncated snippet of the offending expression.
        snippet: String,
        /// The parser's description of the failure.
        reason: String,
    },
}

/// The request fields handed to the external evaluator.
///
/// Borrows from a [`PolicyContextSpec`]; the evaluator sees exactly the
/// fields the cache fingerprint covers, plus the simulated clock.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    /// The requesting principal.
    pub principal: &'a str,
    /// The resource being accessed.
    pub resource: &'a str,
    /// The action attempted.
    pub action: &'a str,
    /// Free-form request attributes.
    pub attributes: &'a BTreeMap<String, serde_json::Value>,
    /// The simulated request time.
    pub now: DateTime<Utc>,
}

impl<'a> From<&'a PolicyContextSpec> for EvaluationRequest<'a> {
    fn from(ctx: &'a PolicyContextSpec) -> Self {
        Self {
            principal: &ctx.principal,
            resource: &ctx.resource,
            action: &ctx.action,
            attributes: &ctx.attributes,
            now: ctx.now,
        }
    }
}

/// The external policy-expression collaborator.
///
/// Implementations wrap a real policy-language runtime. The `Handle`
/// associated type keeps parsed expressions opaque to this engine.
pub trait ExpressionEngine {
    /// A parsed, evaluable expression.
    type Handle;

    /// Parse raw expression text.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError`] on malformed input. The simulator
    /// propagates this to its caller without recovery.
    fn parse(&self, raw: &str) -> Result<Self::Handle, ExpressionError>;

    /// Evaluate parsed expressions against a request, producing the final
    /// combined verdict.
    fn evaluate(&self, handles: &[Self::Handle], request: &EvaluationRequest<'_>) -> Verdict;
}
