//! Tier 3: reconstruct one candidate from loose key/value fragments.
//!
//! Runs when the document is too broken for repair (e.g. a dangling field
//! list that never had its enclosing object). Scans for the individual
//! fields by name; `kind`, `amount` and `description` must all be present
//! or the tier yields nothing.

use std::sync::LazyLock;

use regex::Regex;

use api_types::{CandidateKind, ParseStrategy, TransactionCandidate};

use crate::amount;

// Patterns are compile-time constants; failure here is a programming error.
fn field_re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid field pattern: {err}"))
}

static KIND_RE: LazyLock<Regex> =
    LazyLock::new(|| field_re(r#""(?:type|kind)"\s*:\s*"([A-Za-z_]+)""#));

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| field_re(r#""amount"\s*:\s*(?:"([^"]+)"|([0-9][0-9.,]*))"#));

static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| field_re(r#""description"\s*:\s*"([^"]*)""#));

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    field_re(r#""(?:category|suggested_category|category_hint)"\s*:\s*"([^"]+)""#)
});

static CONFIDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| field_re(r#""confidence"\s*:\s*([01](?:\.[0-9]+)?)"#));

static TRANSFER_RE: LazyLock<Regex> =
    LazyLock::new(|| field_re(r#""(?:transfer_target|transfer_to)"\s*:\s*"([^"]+)""#));

/// Reconstructs exactly one candidate if the minimum field set can be
/// located anywhere in `text`. First occurrence of each field wins.
pub(crate) fn reconstruct(text: &str) -> Option<TransactionCandidate> {
    let kind_str = KIND_RE.captures(text)?.get(1)?.as_str().to_string();
    let kind = CandidateKind::try_from(kind_str.as_str()).ok()?;

    let amount_caps = AMOUNT_RE.captures(text)?;
    let amount_minor = match (amount_caps.get(1), amount_caps.get(2)) {
        (Some(text_amount), _) => amount::parse_shorthand(text_amount.as_str())?,
        (None, Some(number)) => amount::parse_shorthand(number.as_str())?,
        (None, None) => return None,
    };

    let description = DESCRIPTION_RE.captures(text)?.get(1)?.as_str().to_string();

    let mut candidate =
        TransactionCandidate::new(kind, amount_minor, description, ParseStrategy::Hybrid);
    if let Some(caps) = CATEGORY_RE.captures(text)
        && let Some(category) = caps.get(1)
    {
        candidate = candidate.category_hint(category.as_str());
    }
    if let Some(caps) = CONFIDENCE_RE.captures(text)
        && let Some(Ok(confidence)) = caps.get(1).map(|m| m.as_str().parse::<f64>())
    {
        candidate = candidate.confidence(confidence.clamp(0.0, 1.0));
    }
    if let Some(caps) = TRANSFER_RE.captures(text)
        && let Some(target) = caps.get(1)
    {
        candidate = candidate.transfer_target(target.as_str());
    }

    candidate.is_structurally_valid().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_field_list_reconstructs() {
        let text = r#""type": "expense", "amount": 40000, "description": "ăn sáng", "category": "an_uong""#;
        let candidate = reconstruct(text).unwrap();
        assert_eq!(candidate.kind, CandidateKind::Expense);
        assert_eq!(candidate.amount_minor, 40_000);
        assert_eq!(candidate.description, "ăn sáng");
        assert_eq!(candidate.category_hint.as_deref(), Some("an_uong"));
        assert_eq!(candidate.confidence, 0.5);
        assert_eq!(candidate.source_strategy, ParseStrategy::Hybrid);
    }

    #[test]
    fn shorthand_string_amount() {
        let text = r#""type": "income", "amount": "2tr", "description": "lương", "confidence": 0.7"#;
        let candidate = reconstruct(text).unwrap();
        assert_eq!(candidate.amount_minor, 2_000_000);
        assert_eq!(candidate.confidence, 0.7);
    }

    #[test]
    fn missing_required_field_yields_nothing() {
        assert!(reconstruct(r#""type": "expense", "amount": 40000"#).is_none());
        assert!(reconstruct(r#""amount": 40000, "description": "x""#).is_none());
        assert!(reconstruct("").is_none());
    }

    #[test]
    fn transfer_without_target_is_invalid() {
        let text = r#""type": "transfer", "amount": 100000, "description": "chuyển""#;
        assert!(reconstruct(text).is_none());

        let text = r#""type": "transfer", "amount": 100000, "description": "chuyển", "transfer_to": "bank""#;
        let candidate = reconstruct(text).unwrap();
        assert_eq!(candidate.transfer_target.as_deref(), Some("bank"));
    }
}
