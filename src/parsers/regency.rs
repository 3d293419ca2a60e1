use super::rows;
use crate::code::{ancestor, canonical, classify_code};
use crate::models::{CodeLevel, Context, RawRegency, RegencyType, Table};
use crate::text::{cell, collapse_whitespace, normalize_name, split_cell};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::trace;

/// A numbered line opening a regency record:
/// `<ordinal> <NN.NN> <Kabupaten|Kab.|Kota> <name start...>`
static SIGNATURE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\d+\.?\s+(\d{2}\.\d{2})\s+(kabupaten|kab\.?|kota)\s+(.*)$").unwrap()
});

/// Which regency parser a document revision uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegencyStrategy {
    /// Table strategy, falling back to text for pages where tables yield nothing
    #[default]
    Auto,
    Table,
    Text,
}

impl RegencyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegencyStrategy::Auto => "auto",
            RegencyStrategy::Table => "table",
            RegencyStrategy::Text => "text",
        }
    }
}

/// Regency type from the name's leading keyword.
pub fn regency_kind(name: &str) -> RegencyType {
    let upper = name.trim_start().to_uppercase();
    if upper == "KOTA" || upper.starts_with("KOTA ") {
        RegencyType::City
    } else {
        RegencyType::Regency
    }
}

/// Parses a regency listing from table cells.
pub fn parse_regencies_table(
    tables: &[Table],
    page: usize,
    mut ctx: Context,
) -> (Vec<RawRegency>, Context) {
    let mut out = Vec::new();

    for row in rows(tables) {
        if row.len() < 3 {
            continue;
        }

        let codes = split_cell(cell(row, 1));
        let names = split_cell(cell(row, 2));

        for (code, name) in codes.iter().zip(names.iter()) {
            match classify_code(code) {
                CodeLevel::Province => {
                    ctx.province_code = Some(canonical(code));
                }
                CodeLevel::Regency => {
                    let Some(name) = normalize_name(Some(name.as_str())) else {
                        continue;
                    };
                    let code = canonical(code);
                    let Some(province_code) = ancestor(&code, CodeLevel::Province) else {
                        continue;
                    };
                    out.push(RawRegency {
                        province_code,
                        kind: regency_kind(&name),
                        code,
                        name,
                        source_page: page,
                    });
                }
                _ => {}
            }
        }
    }

    (out, ctx)
}

/// Cleanup rules for names recovered from plain text.
pub trait NamePolicy {
    /// A legal reference or footnote line that closes the open record.
    fn is_stop_line(&self, line: &str) -> bool;

    /// A line holding only a capital name, which must not be folded into the
    /// regency name.
    fn is_capital_line(&self, line: &str) -> bool;

    /// Joins name fragments, expands abbreviations and cuts trailing prose.
    fn finish_name(&self, fragments: &[String]) -> String;
}

/// Token tables for the Indonesian decree layout.
#[derive(Debug, Clone)]
pub struct DefaultNamePolicy {
    abbreviations: Vec<(String, String)>,
    stop_line_prefixes: Vec<String>,
    stopwords: FxHashSet<String>,
    illegal_trailing: FxHashSet<String>,
    capital_max_words: usize,
}

impl Default for DefaultNamePolicy {
    fn default() -> Self {
        Self {
            abbreviations: [
                ("KAB.", "Kabupaten"),
                ("KAB", "Kabupaten"),
                ("KEP.", "Kepulauan"),
                ("KEPL.", "Kepulauan"),
                ("ADM.", "Administrasi"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            stop_line_prefixes: strings(&[
                "*)",
                "KETERANGAN",
                "CATATAN",
                "SUMBER",
                "UNDANG-UNDANG",
                "PERATURAN",
                "MENTERI DALAM NEGERI",
            ]),
            stopwords: strings(&[
                "UU",
                "UNDANG-UNDANG",
                "PP",
                "PERATURAN",
                "NOMOR",
                "NO.",
                "TENTANG",
                "JO",
                "JO.",
                "DAN",
                "BERDASARKAN",
                "PEMBENTUKAN",
                "LN",
                "TLN",
            ])
            .into_iter()
            .collect(),
            illegal_trailing: strings(&[
                "-",
                "/",
                "PEMEKARAN",
                "INDUK",
                "(INDUK)",
                "BAGIAN",
                "WILAYAH",
                "U.",
                "S.",
                "T.",
                "B.",
            ])
            .into_iter()
            .collect(),
            capital_max_words: 2,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl DefaultNamePolicy {
    pub fn with_stopword(mut self, word: &str) -> Self {
        self.stopwords.insert(word.to_uppercase());
        self
    }

    pub fn with_illegal_trailing(mut self, token: &str) -> Self {
        self.illegal_trailing.insert(token.to_uppercase());
        self
    }

    pub fn with_abbreviation(mut self, short: &str, full: &str) -> Self {
        self.abbreviations
            .push((short.to_uppercase(), full.to_string()));
        self
    }

    fn expand(&self, token: &str) -> String {
        let upper = token.to_uppercase();
        self.abbreviations
            .iter()
            .find(|(short, _)| *short == upper)
            .map(|(_, full)| full.clone())
            .unwrap_or_else(|| token.to_string())
    }
}

impl NamePolicy for DefaultNamePolicy {
    fn is_stop_line(&self, line: &str) -> bool {
        let upper = line.trim().to_uppercase();
        self.stop_line_prefixes
            .iter()
            .any(|prefix| upper.starts_with(prefix.as_str()))
    }

    fn is_capital_line(&self, line: &str) -> bool {
        let words: Vec<&str> = line.split_whitespace().collect();
        !words.is_empty()
            && words.len() <= self.capital_max_words
            && words.iter().all(|w| {
                let mut chars = w.chars();
                matches!(chars.next(), Some(c) if c.is_uppercase())
                    && chars.all(|c| c.is_alphabetic() && c.is_lowercase())
            })
    }

    fn finish_name(&self, fragments: &[String]) -> String {
        let joined = collapse_whitespace(&fragments.join(" "));
        let mut tokens: Vec<String> = Vec::new();

        for token in joined.split_whitespace() {
            let key = token
                .trim_end_matches([',', ';', ':'])
                .to_uppercase();
            if self.stopwords.contains(&key) {
                break;
            }
            tokens.push(self.expand(token));
        }

        while let Some(last) = tokens.last() {
            if self.illegal_trailing.contains(&last.to_uppercase()) {
                tokens.pop();
            } else {
                break;
            }
        }

        tokens
            .join(" ")
            .trim_end_matches([',', ';', ':'])
            .to_string()
    }
}

struct Candidate {
    code: String,
    kind: RegencyType,
    fragments: Vec<String>,
}

/// Leading non-numeric words of a line; numeric columns end the name.
fn name_prefix(s: &str) -> String {
    s.split_whitespace()
        .take_while(|w| !w.starts_with(|c: char| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flush(
    candidate: Option<Candidate>,
    policy: &dyn NamePolicy,
    page: usize,
    out: &mut Vec<RawRegency>,
) {
    let Some(candidate) = candidate else {
        return;
    };
    let name = policy.finish_name(&candidate.fragments);
    if name.is_empty() {
        trace!(page, code = %candidate.code, "Regency text record without name");
        return;
    }
    let Some(province_code) = ancestor(&candidate.code, CodeLevel::Province) else {
        return;
    };
    let keyword = match candidate.kind {
        RegencyType::City => "Kota",
        RegencyType::Regency => "Kabupaten",
    };
    out.push(RawRegency {
        province_code,
        code: candidate.code,
        name: format!("{} {}", keyword, name),
        kind: candidate.kind,
        source_page: page,
    });
}

/// Parses a regency listing from a page's plain text.
pub fn parse_regencies_text(
    text: &str,
    page: usize,
    ctx: Context,
    policy: &dyn NamePolicy,
) -> (Vec<RawRegency>, Context) {
    let mut out = Vec::new();
    let mut current: Option<Candidate> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if policy.is_stop_line(line) {
            flush(current.take(), policy, page, &mut out);
            continue;
        }

        if let Some(caps) = SIGNATURE_LINE.captures(line) {
            flush(current.take(), policy, page, &mut out);
            let kind = if caps[2].eq_ignore_ascii_case("kota") {
                RegencyType::City
            } else {
                RegencyType::Regency
            };
            let start = name_prefix(&caps[3]);
            current = Some(Candidate {
                code: canonical(&caps[1]),
                kind,
                fragments: if start.is_empty() { Vec::new() } else { vec![start] },
            });
            continue;
        }

        let Some(candidate) = current.as_mut() else {
            continue;
        };
        if line.starts_with(|c: char| c.is_ascii_digit()) || policy.is_capital_line(line) {
            continue;
        }
        let fragment = name_prefix(line);
        if !fragment.is_empty() {
            candidate.fragments.push(fragment);
        }
    }

    flush(current, policy, page, &mut out);
    (out, ctx)
}
