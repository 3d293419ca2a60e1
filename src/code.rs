use crate::models::CodeLevel;
use once_cell::sync::Lazy;
use regex::Regex;

static PROVINCE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}$").unwrap());

static REGENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}$").unwrap());

static DISTRICT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{2}$").unwrap());

static VILLAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{2}\.\d{4}$").unwrap());

static CANONICAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Classifies a code by its segment depth. Dotless canonical codes are
/// classified by digit count (2/4/6/10). Surrounding whitespace is ignored.
pub fn classify_code(code: &str) -> CodeLevel {
    let code = code.trim();

    if code.contains('.') {
        if PROVINCE_CODE.is_match(code) {
            CodeLevel::Province
        } else if REGENCY_CODE.is_match(code) {
            CodeLevel::Regency
        } else if DISTRICT_CODE.is_match(code) {
            CodeLevel::District
        } else if VILLAGE_CODE.is_match(code) {
            CodeLevel::Village
        } else {
            CodeLevel::Other
        }
    } else if CANONICAL_CODE.is_match(code) {
        match code.len() {
            2 => CodeLevel::Province,
            4 => CodeLevel::Regency,
            6 => CodeLevel::District,
            10 => CodeLevel::Village,
            _ => CodeLevel::Other,
        }
    } else {
        CodeLevel::Other
    }
}

/// Removes separators and whitespace: `11.01.01` -> `110101`.
pub fn canonical(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Canonical code of the ancestor at `level`, by truncation.
pub fn ancestor(code: &str, level: CodeLevel) -> Option<String> {
    let canonical = canonical(code);
    let len = match level {
        CodeLevel::Province => 2,
        CodeLevel::Regency => 4,
        CodeLevel::District => 6,
        CodeLevel::Village => 10,
        CodeLevel::Other => return None,
    };
    if canonical.len() < len {
        return None;
    }
    Some(canonical[..len].to_string())
}
