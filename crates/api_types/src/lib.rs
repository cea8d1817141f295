//! Shared data model for the parsing cascade and the batch commit engine.
//!
//! Everything here is plain serde-serializable data: the parsing crate
//! produces it, the confirmation UI edits it, the engine consumes it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Self::Vnd => "VND",
        }
    }
}

impl TryFrom<&str> for Currency {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "VND" => Ok(Self::Vnd),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// What a candidate does to the wallet balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Expense,
    Income,
    Transfer,
}

impl CandidateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for CandidateKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" | "chi" => Ok(Self::Expense),
            "income" | "thu" => Ok(Self::Income),
            "transfer" | "chuyen" => Ok(Self::Transfer),
            other => Err(format!("invalid candidate kind: {other}")),
        }
    }
}

/// Cascade tier that produced a candidate (or gave up).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Direct,
    Repaired,
    Hybrid,
    RuleBased,
    Exhausted,
}

impl ParseStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Repaired => "repaired",
            Self::Hybrid => "hybrid",
            Self::RuleBased => "rule_based",
            Self::Exhausted => "exhausted",
        }
    }
}

impl TryFrom<&str> for ParseStrategy {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "direct" => Ok(Self::Direct),
            "repaired" => Ok(Self::Repaired),
            "hybrid" => Ok(Self::Hybrid),
            "rule_based" => Ok(Self::RuleBased),
            "exhausted" => Ok(Self::Exhausted),
            other => Err(format!("invalid parse strategy: {other}")),
        }
    }
}

/// Bucketed mean confidence of a parse run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceBand {
    /// Buckets the mean candidate confidence.
    ///
    /// Thresholds: `>= 0.75` high, `[0.30, 0.75)` medium, `(0, 0.30)` low,
    /// `0` or no candidates none.
    pub fn from_mean(mean: Option<f64>) -> Self {
        match mean {
            Some(value) if value >= 0.75 => Self::High,
            Some(value) if value >= 0.30 => Self::Medium,
            Some(value) if value > 0.0 => Self::Low,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    NeedsEnhancement,
    NeedsValidation,
    NeedsHumanReview,
    Failed,
}

/// Non-decreasing as the cascade degrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// An unpersisted, possibly low-confidence record produced by parsing,
/// pending user confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    pub kind: CandidateKind,
    /// VND integer amount; always > 0 for a valid candidate.
    pub amount_minor: i64,
    pub description: String,
    /// Symbolic category key, not yet resolved against the store.
    pub category_hint: Option<String>,
    /// In `[0, 1]`; upstream omissions default to 0.5.
    pub confidence: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Receiving wallet identifier or counterparty label ("mẹ",
    /// "tk tiết kiệm"), required iff `kind == transfer` and never the
    /// source wallet itself.
    pub transfer_target: Option<String>,
    pub source_strategy: ParseStrategy,
}

impl TransactionCandidate {
    pub const DEFAULT_CONFIDENCE: f64 = 0.5;

    pub fn new(
        kind: CandidateKind,
        amount_minor: i64,
        description: impl Into<String>,
        source_strategy: ParseStrategy,
    ) -> Self {
        Self {
            kind,
            amount_minor,
            description: description.into(),
            category_hint: None,
            confidence: Self::DEFAULT_CONFIDENCE,
            tags: BTreeSet::new(),
            transfer_target: None,
            source_strategy,
        }
    }

    #[must_use]
    pub fn category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn transfer_target(mut self, target: impl Into<String>) -> Self {
        self.transfer_target = Some(target.into());
        self
    }

    /// Structural validity gate used by the cascade: a strategy only wins if
    /// it yields at least one candidate passing this.
    pub fn is_structurally_valid(&self) -> bool {
        self.amount_minor > 0
            && !self.description.trim().is_empty()
            && (0.0..=1.0).contains(&self.confidence)
            && (self.kind != CandidateKind::Transfer || self.transfer_target.is_some())
    }
}

/// Result of one cascade run. Never an error: unusable input degrades to the
/// `exhausted` variant instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub strategy_used: ParseStrategy,
    pub confidence: ConfidenceBand,
    pub validation_status: ValidationStatus,
    pub risk_level: RiskLevel,
    pub candidates: Vec<TransactionCandidate>,
}

impl ParseOutcome {
    /// Builds the outcome for a winning tier, deriving band, status and risk.
    pub fn from_tier(strategy: ParseStrategy, candidates: Vec<TransactionCandidate>) -> Self {
        if candidates.is_empty() {
            return Self::exhausted();
        }
        let mean = candidates.iter().map(|c| c.confidence).sum::<f64>() / candidates.len() as f64;
        let confidence = ConfidenceBand::from_mean(Some(mean));
        let (validation_status, risk_level) = match strategy {
            ParseStrategy::Direct if confidence == ConfidenceBand::High => {
                (ValidationStatus::Passed, RiskLevel::Low)
            }
            ParseStrategy::Direct => (ValidationStatus::NeedsEnhancement, RiskLevel::Medium),
            ParseStrategy::Repaired | ParseStrategy::Hybrid => {
                (ValidationStatus::NeedsValidation, RiskLevel::Medium)
            }
            ParseStrategy::RuleBased => (ValidationStatus::NeedsHumanReview, RiskLevel::High),
            ParseStrategy::Exhausted => (ValidationStatus::Failed, RiskLevel::Critical),
        };
        Self {
            strategy_used: strategy,
            confidence,
            validation_status,
            risk_level,
            candidates,
        }
    }

    /// Terminal outcome: every tier came up empty. Reportable, not fatal —
    /// the caller must offer manual entry.
    pub fn exhausted() -> Self {
        Self {
            strategy_used: ParseStrategy::Exhausted,
            confidence: ConfidenceBand::None,
            validation_status: ValidationStatus::Failed,
            risk_level: RiskLevel::Critical,
            candidates: Vec::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.strategy_used == ParseStrategy::Exhausted
    }

    /// True when candidates must not be auto-committed without explicit
    /// user confirmation.
    pub fn needs_review(&self) -> bool {
        !matches!(self.validation_status, ValidationStatus::Passed)
    }
}

/// One field-level problem in a commit request. The engine reports all of
/// them, not just the first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Candidate index in the submitted batch; `None` for batch-level issues.
    pub index: Option<usize>,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(index: Option<usize>, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A candidate as submitted to the commit engine: a confirmed
/// [`TransactionCandidate`] plus commit-only fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchCandidate {
    pub kind: CandidateKind,
    pub amount_minor: i64,
    #[serde(default)]
    pub currency: Currency,
    pub description: String,
    pub category_hint: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub transfer_target: Option<String>,
    /// Extra fee charged to the source wallet on a transfer.
    pub transfer_fee_minor: Option<i64>,
    /// Defaults to submission time when absent.
    pub occurred_at: Option<DateTime<Utc>>,
    pub source_strategy: Option<ParseStrategy>,
    pub confidence: Option<f64>,
}

impl From<TransactionCandidate> for BatchCandidate {
    fn from(candidate: TransactionCandidate) -> Self {
        Self {
            kind: candidate.kind,
            amount_minor: candidate.amount_minor,
            currency: Currency::Vnd,
            description: candidate.description,
            category_hint: candidate.category_hint,
            tags: candidate.tags,
            transfer_target: candidate.transfer_target,
            transfer_fee_minor: None,
            occurred_at: None,
            source_strategy: Some(candidate.source_strategy),
            confidence: Some(candidate.confidence),
        }
    }
}

/// The engine's persisted API boundary: one batch, one idempotency token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub user_id: String,
    pub wallet_id: String,
    /// Caller-supplied token; resubmitting it replays the prior receipt.
    pub idempotency_key: String,
    pub candidates: Vec<BatchCandidate>,
}

/// Proof of a committed (or replayed) batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub batch_id: Uuid,
    pub transaction_ids: Vec<Uuid>,
    pub balance_before_minor: i64,
    pub balance_after_minor: i64,
    /// True when the idempotency key had already been applied and this
    /// receipt is the prior one, replayed.
    pub duplicate: bool,
}
