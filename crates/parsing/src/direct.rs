//! Tier 1: interpret the raw upstream response as the complete expected
//! payload.
//!
//! The schema is tolerant in field naming (`type`/`kind`,
//! `category`/`suggested_category`, `transfer_to`/`transfer_target`) because
//! the upstream model drifts, but the document itself must be structurally
//! whole — anything else is a [`StructuralError`] that hands control to the
//! repair tier.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use api_types::{CandidateKind, ParseStrategy, TransactionCandidate};

use crate::amount;

/// The document failed to parse at all. Distinct from "parsed fine but no
/// usable items": only the former is worth a repair attempt.
pub(crate) struct StructuralError;

#[derive(Debug, Deserialize)]
pub(crate) struct Payload {
    #[serde(default)]
    transactions: Vec<Item>,
    /// Aggregate confidence; seeds items that lack their own.
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "type", alias = "kind")]
    kind: Option<String>,
    amount: Option<Value>,
    description: Option<String>,
    #[serde(alias = "suggested_category", alias = "category_hint")]
    category: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(alias = "transfer_to")]
    transfer_target: Option<String>,
}

/// Parses `text` as the full payload and maps it to structurally valid
/// candidates tagged with `strategy`.
///
/// Items that do not survive validation (bad kind, non-positive amount,
/// empty description, transfer without target) are dropped, not fatal.
pub(crate) fn parse_payload(
    text: &str,
    strategy: ParseStrategy,
) -> Result<Vec<TransactionCandidate>, StructuralError> {
    let payload: Payload = serde_json::from_str(text).map_err(|_| StructuralError)?;
    Ok(map_payload(payload, strategy))
}

fn map_payload(payload: Payload, strategy: ParseStrategy) -> Vec<TransactionCandidate> {
    let aggregate = payload.confidence;
    payload
        .transactions
        .into_iter()
        .filter_map(|item| map_item(item, aggregate, strategy))
        .collect()
}

fn map_item(
    item: Item,
    aggregate_confidence: Option<f64>,
    strategy: ParseStrategy,
) -> Option<TransactionCandidate> {
    let kind = CandidateKind::try_from(item.kind?.as_str()).ok()?;
    let amount_minor = amount::from_json(&item.amount?)?;
    let description = item.description?;

    let confidence = item
        .confidence
        .or(aggregate_confidence)
        .unwrap_or(TransactionCandidate::DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let tags: BTreeSet<String> = item
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let candidate = TransactionCandidate {
        kind,
        amount_minor,
        description,
        category_hint: item.category.filter(|c| !c.trim().is_empty()),
        confidence,
        tags,
        transfer_target: item.transfer_target.filter(|t| !t.trim().is_empty()),
        source_strategy: strategy,
    };
    candidate.is_structurally_valid().then_some(candidate)
}
