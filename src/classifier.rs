use crate::models::{PageType, Row, Table};
use once_cell::sync::Lazy;
use regex::Regex;

static FOOTNOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+\)").unwrap());

/// Last normalized token of the header cells the rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTokens {
    pub first: String,
    pub third: String,
}

impl HeaderTokens {
    pub fn from_row(header: &Row) -> Self {
        let token = |idx: usize| normalize_header_cell(header.get(idx).and_then(|c| c.as_deref()));
        Self {
            first: token(0),
            third: token(2),
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub predicate: fn(&HeaderTokens) -> bool,
    pub result: PageType,
}

/// Classification rules in strict priority order; the first match wins.
pub static RULES: [Rule; 4] = [
    Rule {
        name: "code-keyed leaf listing",
        predicate: |h| h.first == "KODE",
        result: PageType::Village,
    },
    Rule {
        name: "numbered province listing",
        predicate: |h| h.third == "PROVINSI" && h.first == "NO",
        result: PageType::Province,
    },
    Rule {
        name: "numbered regency/city listing",
        predicate: |h| h.third == "KOTA" && h.first == "NO",
        result: PageType::RegencyCity,
    },
    Rule {
        name: "numbered district listing",
        predicate: |h| h.third == "KECAMATAN" && h.first == "NO",
        result: PageType::District,
    },
];

/// Classifies a page from its tables; only the first table's first row is used.
pub fn classify_page(tables: &[Table]) -> PageType {
    match tables.first().and_then(|t| t.first()) {
        Some(header) if !header.is_empty() => classify_header(header),
        _ => PageType::Unknown,
    }
}

pub fn classify_header(header: &Row) -> PageType {
    let tokens = HeaderTokens::from_row(header);
    RULES
        .iter()
        .find(|rule| (rule.predicate)(&tokens))
        .map(|rule| rule.result)
        .unwrap_or(PageType::Unknown)
}

/// Uppercases, strips footnote markers, joins letter-spaced words
/// (`K O D E` -> `KODE`) and returns the final whitespace-delimited token.
pub fn normalize_header_cell(cell: Option<&str>) -> String {
    let upper = match cell {
        Some(s) => s.to_uppercase(),
        None => return String::new(),
    };
    let stripped = FOOTNOTE_MARKER.replace_all(&upper, " ");

    let mut words: Vec<String> = Vec::new();
    let mut previous_single = false;
    for token in stripped.split_whitespace() {
        let single = is_single_letter(token);
        match words.last_mut() {
            Some(last) if single && previous_single => last.push_str(token),
            _ => words.push(token.to_string()),
        }
        previous_single = single;
    }

    words.pop().unwrap_or_default()
}

fn is_single_letter(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[Option<&str>]) -> Row {
        cells.iter().map(|c| c.map(|s| s.to_string())).collect()
    }

    fn page(cells: &[Option<&str>]) -> Vec<Table> {
        vec![vec![header(cells)]]
    }

    #[test]
    fn normalizes_letter_spacing() {
        assert_eq!(normalize_header_cell(Some("K O D E")), "KODE");
        assert_eq!(normalize_header_cell(Some("N O")), "NO");
        assert_eq!(normalize_header_cell(Some("NAMA K E C A M A T A N")), "KECAMATAN");
    }

    #[test]
    fn strips_footnotes_and_takes_last_token() {
        assert_eq!(normalize_header_cell(Some("nama provinsi*)")), "PROVINSI");
        assert_eq!(normalize_header_cell(Some("NAMA KABUPATEN/\nKOTA **)")), "KOTA");
        assert_eq!(normalize_header_cell(Some("K O D E*)")), "KODE");
    }

    #[test]
    fn blank_cell_normalizes_to_empty() {
        assert_eq!(normalize_header_cell(None), "");
        assert_eq!(normalize_header_cell(Some("  ")), "");
        assert_eq!(normalize_header_cell(Some("*)")), "");
    }

    #[test]
    fn classifies_each_listing() {
        assert_eq!(
            classify_page(&page(&[Some("NO"), Some("KODE"), Some("NAMA PROVINSI")])),
            PageType::Province
        );
        assert_eq!(
            classify_page(&page(&[Some("NO"), Some("KODE"), Some("NAMA KABUPATEN/ KOTA")])),
            PageType::RegencyCity
        );
        assert_eq!(
            classify_page(&page(&[Some("N O"), Some("KODE"), Some("NAMA KECAMATAN")])),
            PageType::District
        );
        assert_eq!(
            classify_page(&page(&[Some("K O D E"), Some("NAMA"), Some("KECAMATAN")])),
            PageType::Village
        );
    }

    #[test]
    fn code_column_ignores_third_column() {
        assert_eq!(
            classify_page(&page(&[Some("KODE"), None, Some("NAMA PROVINSI")])),
            PageType::Village
        );
    }

    #[test]
    fn numbered_rules_need_no_column() {
        assert_eq!(
            classify_page(&page(&[Some("NOMOR URUT"), None, Some("NAMA PROVINSI")])),
            PageType::Unknown
        );
        assert_eq!(
            classify_page(&page(&[None, None, Some("KECAMATAN")])),
            PageType::Unknown
        );
    }

    #[test]
    fn no_table_or_short_header_is_unknown() {
        assert_eq!(classify_page(&[]), PageType::Unknown);
        assert_eq!(classify_page(&[vec![]]), PageType::Unknown);
        assert_eq!(classify_page(&page(&[Some("NO")])), PageType::Unknown);
        assert_eq!(
            classify_page(&page(&[Some("1"), Some("11"), Some("ACEH")])),
            PageType::Unknown
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let tables = page(&[Some("NO"), Some("KODE"), Some("NAMA KECAMATAN")]);
        let first = classify_page(&tables);
        for _ in 0..3 {
            assert_eq!(classify_page(&tables), first);
        }
    }

    #[test]
    fn rules_are_listed_in_priority_order() {
        let order: Vec<PageType> = RULES.iter().map(|r| r.result).collect();
        assert_eq!(
            order,
            vec![
                PageType::Village,
                PageType::Province,
                PageType::RegencyCity,
                PageType::District
            ]
        );
        assert!(RULES.iter().all(|r| !r.name.is_empty()));
    }
}
