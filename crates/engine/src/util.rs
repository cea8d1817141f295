use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Normalize a category name or hint for lookup.
///
/// Vietnamese input arrives in many spellings: with or without diacritics,
/// with underscores from machine hints ("an_uong") or spaces from humans
/// ("Ăn uống"). All of them must hit the same `name_norm` row, so the key
/// is NFKD with combining marks stripped, lowercased, with separator runs
/// collapsed to single spaces.
pub(crate) fn normalize_category_key(value: &str) -> String {
    let stripped: String = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            '_' | '-' => ' ',
            other => other,
        })
        .collect();

    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::KeyNotFound(format!("{label} not exists")))
}
