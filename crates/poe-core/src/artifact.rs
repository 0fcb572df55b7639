//! # Policy Artifacts
//!
//! A policy artifact is one enforcement unit — an access rule, a
//! remediation step — produced by an external contract adapter. It carries
//! the opaque enforcement expression plus the scheduling and lifecycle
//! metadata the orchestration engine needs: severity, rollout mode,
//! priority, execution windows, and state.
//!
//! Artifacts are immutable once created by the adapter; only `state` and
//! `revision` are expected to change over an artifact's lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{ArtifactId, ContractId};
use crate::temporal::TimeWindow;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Enforcement severity of an artifact.
///
/// Ordered: `Critical` ranks above `High` ranks above `Medium` ranks above
/// `Low`, so `max()` over a set of artifacts yields the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Lowest severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Highest severity.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestrationState
// ---------------------------------------------------------------------------

/// Lifecycle state shared by artifacts and plans.
///
/// A freshly planned, warning-free plan is `Draft`; a plan carrying at
/// least one error-severity warning is `Degraded`. Artifacts move through
/// the full set over their lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    /// Created but not yet queued for execution.
    Draft,
    /// Waiting for execution.
    Queued,
    /// Currently enforced / executing.
    Active,
    /// Temporarily suspended.
    Paused,
    /// Operating with known defects.
    Degraded,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl OrchestrationState {
    /// Return whether this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Queued => f.write_str("queued"),
            Self::Active => f.write_str("active"),
            Self::Paused => f.write_str("paused"),
            Self::Degraded => f.write_str("degraded"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// RolloutMode
// ---------------------------------------------------------------------------

/// How an artifact's enforcement is rolled out across its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutMode {
    /// Small slice first, then full rollout.
    Canary,
    /// Parallel environment switchover.
    BlueGreen,
    /// Incremental host-by-host rollout.
    Rolling,
    /// Fixed-rate linear rollout.
    Linear,
}

impl std::fmt::Display for RolloutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canary => f.write_str("canary"),
            Self::BlueGreen => f.write_str("blue_green"),
            Self::Rolling => f.write_str("rolling"),
            Self::Linear => f.write_str("linear"),
        }
    }
}

// ---------------------------------------------------------------------------
// EnforcementTarget
// ---------------------------------------------------------------------------

/// Where an artifact's enforcement applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementTarget {
    /// Deployment region.
    pub region: String,
    /// Target service name.
    pub service: String,
    /// Target environment (e.g. `production`, `staging`).
    pub environment: String,
    /// Free-form selector tags.
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// PolicyArtifact
// ---------------------------------------------------------------------------

/// One enforcement unit, as produced by an external contract adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyArtifact {
    /// Unique artifact identifier.
    pub id: ArtifactId,
    /// Human-readable name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Owning principal or team.
    pub owner: String,
    /// Where enforcement applies.
    pub target: EnforcementTarget,
    /// The enforcement expression — opaque to this engine.
    pub expression: String,
    /// Enforcement severity.
    pub severity: Severity,
    /// Current lifecycle state.
    pub state: OrchestrationState,
    /// Rollout strategy.
    pub mode: RolloutMode,
    /// Scheduling priority (higher wins).
    pub priority: i32,
    /// Execution windows; empty means "planner default window applies".
    pub windows: Vec<TimeWindow>,
    /// Semantic version of the artifact definition.
    pub version: String,
    /// Monotonic revision counter.
    pub revision: u32,
    /// The external contract this artifact was converted from, if any.
    pub source_contract: Option<ContractId>,
    /// When the adapter created this artifact.
    pub created_at: DateTime<Utc>,
    /// When the artifact last changed state or revision.
    pub updated_at: DateTime<Utc>,
}

impl PolicyArtifact {
    /// Create an artifact with default metadata.
    ///
    /// Defaults: medium severity, draft state, rolling mode, priority 0,
    /// no windows, revision 0, no source contract.
    pub fn new(id: ArtifactId, name: impl Into<String>, expression: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            owner: String::new(),
            target: EnforcementTarget::default(),
            expression: expression.into(),
            severity: Severity::Medium,
            state: OrchestrationState::Draft,
            mode: RolloutMode::Rolling,
            priority: 0,
            windows: Vec::new(),
            version: "0.1.0".to_string(),
            revision: 0,
            source_contract: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Builder: set the rollout mode.
    pub fn with_mode(mut self, mode: RolloutMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: add an execution window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.windows.push(window);
        self
    }

    /// Builder: record the source contract.
    pub fn with_source_contract(mut self, contract: ContractId) -> Self {
        self.source_contract = Some(contract);
        self
    }

    /// Transition the lifecycle state, bumping revision and `updated_at`.
    ///
    /// State and revision are the only fields expected to change after an
    /// adapter creates the artifact.
    pub fn transition(&mut self, state: OrchestrationState) {
        self.state = state;
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}
