//! Four-tier parsing cascade turning an unreliable upstream text-generation
//! response into transaction candidates.
//!
//! Tiers, in strict order, first success wins:
//!
//! 1. `direct` — the response is a complete structured payload.
//! 2. `repair` — bounded heuristic repair of a broken payload, then
//!    re-parse. Only attempted when tier 1 failed *structurally*.
//! 3. `hybrid` — reconstruct one candidate from loose field fragments.
//! 4. `rules` — lexical extraction from the user's original Vietnamese
//!    text, ignoring the response entirely.
//!
//! [`parse`] is pure and total: pathological input (empty, binary noise,
//! megabytes of prose) degrades to an `exhausted` outcome, never a panic or
//! error.

use api_types::{ParseOutcome, ParseStrategy};

mod amount;
mod direct;
mod hybrid;
mod repair;
mod rules;

/// Runs the cascade over the upstream response and the user's original
/// message.
pub fn parse(raw_response: &str, original_text: &str) -> ParseOutcome {
    let structurally_broken = match direct::parse_payload(raw_response, ParseStrategy::Direct) {
        Ok(candidates) if !candidates.is_empty() => {
            return ParseOutcome::from_tier(ParseStrategy::Direct, candidates);
        }
        // Parsed whole but nothing usable: repairing the same document
        // cannot change that, skip straight to hybrid.
        Ok(_) => false,
        Err(_) => true,
    };

    if structurally_broken {
        tracing::debug!("direct parse failed structurally, attempting repair");
        if let Some(repaired) = repair::repair(raw_response)
            && let Ok(candidates) = direct::parse_payload(&repaired, ParseStrategy::Repaired)
            && !candidates.is_empty()
        {
            return ParseOutcome::from_tier(ParseStrategy::Repaired, candidates);
        }
    }

    tracing::debug!("structured tiers empty, attempting hybrid reconstruction");
    if let Some(candidate) = hybrid::reconstruct(raw_response) {
        return ParseOutcome::from_tier(ParseStrategy::Hybrid, vec![candidate]);
    }

    tracing::debug!("falling back to rule-based extraction of the original text");
    let candidates = rules::extract(original_text);
    if !candidates.is_empty() {
        return ParseOutcome::from_tier(ParseStrategy::RuleBased, candidates);
    }

    ParseOutcome::exhausted()
}
