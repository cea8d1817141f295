use api_types::{
    CandidateKind, ConfidenceBand, ParseStrategy, RiskLevel, ValidationStatus,
};
use parsing::parse;

const WELL_FORMED: &str = r#"{
    "transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng",
         "category": "an_uong", "confidence": 0.9},
        {"type": "expense", "amount": 25000, "description": "cà phê",
         "category": "ca_phe", "confidence": 0.8}
    ],
    "confidence": 0.85
}"#;

#[test]
fn well_formed_high_confidence_is_direct_passed() {
    let outcome = parse(WELL_FORMED, "ăn sáng 40k với cà phê 25k");
    assert_eq!(outcome.strategy_used, ParseStrategy::Direct);
    assert_eq!(outcome.validation_status, ValidationStatus::Passed);
    assert_eq!(outcome.confidence, ConfidenceBand::High);
    assert_eq!(outcome.risk_level, RiskLevel::Low);
    assert_eq!(outcome.candidates.len(), 2);
}

#[test]
fn low_aggregate_confidence_needs_enhancement() {
    let response = r#"{"transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng", "confidence": 0.4}
    ]}"#;
    let outcome = parse(response, "ăn sáng 40k");
    assert_eq!(outcome.strategy_used, ParseStrategy::Direct);
    assert_eq!(outcome.validation_status, ValidationStatus::NeedsEnhancement);
    assert_eq!(outcome.risk_level, RiskLevel::Medium);
}

#[test]
fn unmatched_brace_is_repaired_with_full_candidate_count() {
    // The closing brace of the wrapper object is missing.
    let truncated = r#"{"transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng"},
        {"type": "expense", "amount": 25000, "description": "cà phê"}
    ]"#;
    let outcome = parse(truncated, "");
    assert_eq!(outcome.strategy_used, ParseStrategy::Repaired);
    assert_eq!(outcome.validation_status, ValidationStatus::NeedsValidation);
    assert_eq!(outcome.risk_level, RiskLevel::Medium);
    assert_eq!(outcome.candidates.len(), 2);
}

#[test]
fn truncation_after_item_separator_keeps_the_complete_items() {
    // Cut off right after the comma separating two items: the appended
    // closers turn that separator into a trailing comma, which the comma
    // pass then removes. The complete first item survives repair instead
    // of degrading to hybrid reconstruction.
    let truncated = r#"{"transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng"},
        {"type": "expense", "amount": 25000, "description": "cà phê"},"#;
    let outcome = parse(truncated, "");
    assert_eq!(outcome.strategy_used, ParseStrategy::Repaired);
    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.candidates[0].amount_minor, 40_000);
    assert_eq!(outcome.candidates[1].amount_minor, 25_000);
}

#[test]
fn fenced_response_is_repaired() {
    let fenced = format!("```json\n{WELL_FORMED}\n```");
    let outcome = parse(&fenced, "");
    assert_eq!(outcome.strategy_used, ParseStrategy::Repaired);
    assert_eq!(outcome.candidates.len(), 2);
}

#[test]
fn trailing_comma_repair_matches_comma_free_equivalent() {
    let with_comma = r#"{"transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng",},
    ],}"#;
    let without_comma = r#"{"transactions": [
        {"type": "expense", "amount": 40000, "description": "ăn sáng"}
    ]}"#;
    let repaired = parse(with_comma, "");
    let clean = parse(without_comma, "");
    assert_eq!(repaired.strategy_used, ParseStrategy::Repaired);
    assert_eq!(clean.strategy_used, ParseStrategy::Direct);
    assert_eq!(repaired.candidates[0].amount_minor, clean.candidates[0].amount_minor);
    assert_eq!(repaired.candidates[0].description, clean.candidates[0].description);
    assert_eq!(repaired.candidates.len(), clean.candidates.len());
}

#[test]
fn unusable_response_falls_back_to_rules() {
    let outcome = parse("xin lỗi, tôi không thể giúp", "ăn sáng 40k, xăng 50k");
    assert_eq!(outcome.strategy_used, ParseStrategy::RuleBased);
    assert_eq!(outcome.validation_status, ValidationStatus::NeedsHumanReview);
    assert_eq!(outcome.risk_level, RiskLevel::High);
    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.candidates[0].amount_minor, 40_000);
    assert_eq!(outcome.candidates[1].amount_minor, 50_000);
    assert!(
        outcome
            .candidates
            .iter()
            .all(|c| c.kind == CandidateKind::Expense)
    );
}

#[test]
fn nothing_recognizable_is_exhausted() {
    let outcome = parse("%%%###", "hôm nay trời đẹp");
    assert!(outcome.is_exhausted());
    assert_eq!(outcome.confidence, ConfidenceBand::None);
    assert_eq!(outcome.validation_status, ValidationStatus::Failed);
    assert_eq!(outcome.risk_level, RiskLevel::Critical);
    assert!(outcome.candidates.is_empty());
}

#[test]
fn shorthand_round_trip_through_rules() {
    let outcome = parse("", "thưởng 2tr và gửi xe 50k");
    let amounts: Vec<i64> = outcome.candidates.iter().map(|c| c.amount_minor).collect();
    assert!(amounts.contains(&2_000_000));
    assert!(amounts.contains(&50_000));
}

#[test]
fn pathological_input_stays_bounded() {
    let long = "a".repeat(512 * 1024);
    let outcome = parse(&long, &long);
    assert!(outcome.is_exhausted());

    let outcome = parse("\u{0}\u{fffd}🙂", "😀😀😀");
    assert!(outcome.is_exhausted());
}
