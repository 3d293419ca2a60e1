use crate::models::Row;
use once_cell::sync::Lazy;
use regex::Regex;

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t\x0B\x0C]+").unwrap());

static LEADING_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.?\s+").unwrap());

/// Collapses any run of whitespace into one space and trims.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a name cell: control characters become spaces, whitespace is
/// collapsed. Returns `None` for missing or blank cells.
pub fn clean_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let replaced = CONTROL_CHARS.replace_all(value, " ");
    let collapsed = collapse_whitespace(&replaced);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Drops a single leading row number: `"1 Kuta Alam"` -> `"Kuta Alam"`.
pub fn strip_ordinal(name: &str) -> String {
    LEADING_ORDINAL.replace(name, "").trim().to_string()
}

/// Full name normalization used by every parser.
pub fn normalize_name(value: Option<&str>) -> Option<String> {
    let cleaned = clean_name(value)?;
    let stripped = strip_ordinal(&cleaned);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Splits a cell holding a newline-separated list into trimmed, non-empty items.
pub fn split_cell(cell: Option<&str>) -> Vec<String> {
    match cell {
        Some(s) => s
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Trimmed text of the cell at `idx`, or `""` when missing.
pub fn cell_text(row: &Row, idx: usize) -> &str {
    row.get(idx)
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .unwrap_or("")
}

/// Raw cell at `idx` without trimming.
pub fn cell(row: &Row, idx: usize) -> Option<&str> {
    row.get(idx).and_then(|c| c.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_collapses_control_chars() {
        assert_eq!(
            clean_name(Some("Banda\nAceh\t ")).as_deref(),
            Some("Banda Aceh")
        );
        assert_eq!(
            clean_name(Some("Aceh   Besar")).as_deref(),
            Some("Aceh Besar")
        );
    }

    #[test]
    fn clean_name_blank_is_none() {
        assert_eq!(clean_name(Some("  \n ")), None);
        assert_eq!(clean_name(None), None);
    }

    #[test]
    fn strip_ordinal_removes_one_leading_number() {
        assert_eq!(strip_ordinal("1 Kuta Alam"), "Kuta Alam");
        assert_eq!(strip_ordinal("12. Meuraxa"), "Meuraxa");
        assert_eq!(strip_ordinal("3 2 X 11 Kayu Tanam"), "2 X 11 Kayu Tanam");
        assert_eq!(strip_ordinal("Lhoknga"), "Lhoknga");
    }

    #[test]
    fn normalize_name_only_ordinal_is_none() {
        assert_eq!(normalize_name(Some("7 ")), Some("7".to_string()));
        assert_eq!(normalize_name(Some("  ")), None);
        assert_eq!(
            normalize_name(Some("2\nUlee Kareng")).as_deref(),
            Some("Ulee Kareng")
        );
    }

    #[test]
    fn split_cell_drops_blank_lines() {
        assert_eq!(
            split_cell(Some("11\n\n 12 \n")),
            vec!["11".to_string(), "12".to_string()]
        );
        assert!(split_cell(None).is_empty());
    }

    #[test]
    fn cell_text_handles_missing_columns() {
        let row: Row = vec![Some(" 11 ".to_string()), None];
        assert_eq!(cell_text(&row, 0), "11");
        assert_eq!(cell_text(&row, 1), "");
        assert_eq!(cell_text(&row, 5), "");
    }
}
