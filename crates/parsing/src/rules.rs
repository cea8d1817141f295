//! Tier 4: rule-based extraction from the user's original Vietnamese text.
//!
//! The terminal fallback never looks at the upstream response. A declarative
//! table of (cue, kind, category) rows is evaluated by one generic matcher:
//! new idioms are new rows, not new code paths. Matching is global and
//! overlap-tolerant across the text, but a given amount is claimed by the
//! first rule that reaches it so `mua xăng 50k` is transport, not shopping.

use std::sync::LazyLock;

use regex::Regex;

use api_types::{CandidateKind, ParseStrategy, TransactionCandidate};

use crate::amount;

/// Every rule-based candidate carries this fixed confidence.
pub(crate) const RULE_CONFIDENCE: f64 = 0.6;

/// Tag marking a candidate as fallback-extracted, for the review UI.
pub(crate) const FALLBACK_TAG: &str = "fallback";

/// A number, an optional shorthand unit, and at most a short non-numeric
/// gap between cue and number.
const AMOUNT_PART: &str = r"[^0-9]{0,16}?(\d+(?:[.,]\d+)?)\s*(k|tr|triệu|trieu|nghìn|nghin|ngàn|ngan)?\b";

struct Rule {
    cues: &'static str,
    kind: CandidateKind,
    category: &'static str,
}

/// Ordered by specificity: earlier rows claim their amounts first, so the
/// generic shopping/receive rows only pick up what nothing else matched.
const RULES: [Rule; 11] = [
    Rule {
        cues: "ăn sáng|ăn trưa|ăn tối|ăn vặt|ăn uống|ăn|cơm|phở|bún",
        kind: CandidateKind::Expense,
        category: "an_uong",
    },
    Rule {
        cues: "cà phê|ca phe|cafe|trà sữa|tra sua|nhậu|uống",
        kind: CandidateKind::Expense,
        category: "ca_phe",
    },
    Rule {
        cues: "xăng|xang|grab|xe ôm|xe om|gửi xe|gui xe|taxi|vé xe|ve xe",
        kind: CandidateKind::Expense,
        category: "di_chuyen",
    },
    Rule {
        cues: "tiền nhà|tien nha|thuê nhà|thue nha",
        kind: CandidateKind::Expense,
        category: "nha_cua",
    },
    Rule {
        cues: "tiền điện|tien dien|tiền nước|tien nuoc|điện thoại|dien thoai|internet|hóa đơn|hoa don",
        kind: CandidateKind::Expense,
        category: "hoa_don",
    },
    Rule {
        cues: "lương|luong|lĩnh lương|linh luong",
        kind: CandidateKind::Income,
        category: "luong",
    },
    Rule {
        cues: "thưởng|thuong",
        kind: CandidateKind::Income,
        category: "thuong",
    },
    // After salary/bonus so "nhận lương"/"nhận thưởng" keep their category.
    Rule {
        cues: "nhận|nhan|được cho|duoc cho",
        kind: CandidateKind::Income,
        category: "khac",
    },
    Rule {
        cues: "tặng|tang|mừng cưới|mung cuoi|lì xì|li xi",
        kind: CandidateKind::Expense,
        category: "qua_tang",
    },
    // Bare "mừng" after the wedding-gift expense row: "mừng cưới 500k" is
    // money given, "được mừng 2tr" is money received.
    Rule {
        cues: "mừng|mung",
        kind: CandidateKind::Income,
        category: "qua_tang",
    },
    Rule {
        cues: "mua sắm|mua",
        kind: CandidateKind::Expense,
        category: "mua_sam",
    },
];

struct CompiledRule {
    re: Regex,
    kind: CandidateKind,
    category: &'static str,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| {
            let pattern = format!(r"(?i)\b(?:{}){}", rule.cues, AMOUNT_PART);
            let re = Regex::new(&pattern)
                .unwrap_or_else(|err| panic!("invalid rule pattern for {}: {err}", rule.category));
            CompiledRule {
                re,
                kind: rule.kind,
                category: rule.category,
            }
        })
        .collect()
});

/// Applies the whole table to `original_text`, yielding zero or more
/// candidates ordered by their position in the text.
pub(crate) fn extract(original_text: &str) -> Vec<TransactionCandidate> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, TransactionCandidate)> = Vec::new();

    for rule in COMPILED.iter() {
        for caps in rule.re.captures_iter(original_text) {
            let Some(number) = caps.get(1) else { continue };
            let span = (number.start(), number.end());
            if claimed
                .iter()
                .any(|&(start, end)| span.0 < end && start < span.1)
            {
                continue;
            }
            let unit = caps.get(2).map(|m| m.as_str());
            let Some(amount_minor) = amount::from_captures(number.as_str(), unit) else {
                continue;
            };
            let Some(full) = caps.get(0) else { continue };
            let description = full.as_str().trim_matches([' ', ',', '.', ';']).to_string();

            claimed.push(span);
            found.push((
                full.start(),
                TransactionCandidate::new(
                    rule.kind,
                    amount_minor,
                    description,
                    ParseStrategy::RuleBased,
                )
                .category_hint(rule.category)
                .confidence(RULE_CONFIDENCE)
                .tag(FALLBACK_TAG),
            ));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_idioms_two_candidates() {
        let candidates = extract("ăn sáng 40k, xăng 50k");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].amount_minor, 40_000);
        assert_eq!(candidates[0].category_hint.as_deref(), Some("an_uong"));
        assert_eq!(candidates[1].amount_minor, 50_000);
        assert_eq!(candidates[1].category_hint.as_deref(), Some("di_chuyen"));
        assert!(candidates.iter().all(|c| c.confidence == RULE_CONFIDENCE));
        assert!(candidates.iter().all(|c| c.tags.contains(FALLBACK_TAG)));
    }

    #[test]
    fn salary_is_income_with_million_shorthand() {
        let candidates = extract("hôm nay nhận lương 12tr");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, CandidateKind::Income);
        assert_eq!(candidates[0].amount_minor, 12_000_000);
        assert_eq!(candidates[0].category_hint.as_deref(), Some("luong"));
    }

    #[test]
    fn receiving_money_is_income() {
        let candidates = extract("nhận 500k từ mẹ");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, CandidateKind::Income);
        assert_eq!(candidates[0].amount_minor, 500_000);
    }

    #[test]
    fn bare_mung_is_money_received_but_mung_cuoi_is_money_given() {
        let received = extract("được mừng 2tr");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, CandidateKind::Income);
        assert_eq!(received[0].amount_minor, 2_000_000);

        let given = extract("mừng cưới 500k");
        assert_eq!(given.len(), 1);
        assert_eq!(given[0].kind, CandidateKind::Expense);
        assert_eq!(given[0].category_hint.as_deref(), Some("qua_tang"));
    }

    #[test]
    fn specific_rule_claims_amount_before_generic() {
        // "mua" would also match, but transport reaches the amount first.
        let candidates = extract("mua xăng 50k");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].category_hint.as_deref(), Some("di_chuyen"));
    }

    #[test]
    fn diacritic_free_text_still_matches() {
        let candidates = extract("an sang 40k va ca phe 25k");
        // "an sang" has no cue without diacritics for eating ("ăn"), but
        // coffee matches through its ascii alias.
        assert!(
            candidates
                .iter()
                .any(|c| c.category_hint.as_deref() == Some("ca_phe") && c.amount_minor == 25_000)
        );
    }

    #[test]
    fn unrecognizable_text_yields_nothing() {
        assert!(extract("hôm nay trời đẹp quá").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn word_units_spelled_out() {
        let candidates = extract("gửi xe 5 nghìn");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].amount_minor, 5_000);
    }
}
