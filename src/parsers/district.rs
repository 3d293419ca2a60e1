use super::rows;
use crate::code::{canonical, classify_code};
use crate::config::{DISTRICT_CAPITAL_COL, DISTRICT_CODE_COL, DISTRICT_NAME_COL};
use crate::models::{CodeLevel, Context, RawDistrict, Table};
use crate::text::{cell, cell_text, clean_name, normalize_name};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    code: usize,
    name: usize,
    capital: Option<usize>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            code: DISTRICT_CODE_COL,
            name: DISTRICT_NAME_COL,
            capital: Some(DISTRICT_CAPITAL_COL),
        }
    }
}

/// Finds the code/name/capital columns from the first two header rows of the
/// first table. Continuation pages carry no header and use the default layout.
fn detect_columns(tables: &[Table]) -> Columns {
    let Some(table) = tables.first() else {
        return Columns::default();
    };

    let header_rows = &table[..table.len().min(2)];
    let width = header_rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let merged: Vec<String> = (0..width)
        .map(|i| {
            header_rows
                .iter()
                .filter_map(|r| cell(r, i))
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase()
        })
        .collect();

    let find = |keyword: &str| merged.iter().position(|h| h.contains(keyword));

    match (find("KODE"), find("KECAMATAN")) {
        (Some(code), Some(name)) => Columns {
            code,
            name,
            capital: find("IBUKOTA"),
        },
        _ => Columns::default(),
    }
}

/// Parses a district listing page.
///
/// Province rows set the province code and capital (and close the current
/// regency); regency rows set the regency code and capital. District rows
/// become raw rows only once both ancestors are known.
pub fn parse_districts(
    tables: &[Table],
    page: usize,
    mut ctx: Context,
) -> (Vec<RawDistrict>, Context) {
    let columns = detect_columns(tables);
    let mut out = Vec::new();

    for row in rows(tables) {
        if columns.code >= row.len() {
            continue;
        }

        let code = cell_text(row, columns.code);
        if code.is_empty() {
            continue;
        }
        let capital = columns.capital.and_then(|idx| clean_name(cell(row, idx)));

        match classify_code(code) {
            CodeLevel::Province => {
                ctx.province_code = Some(canonical(code));
                ctx.province_capital = capital;
                ctx.regency_code = None;
                ctx.regency_capital = None;
                ctx.district_code = None;
            }
            CodeLevel::Regency => {
                ctx.regency_code = Some(canonical(code));
                ctx.regency_capital = capital;
                ctx.district_code = None;
            }
            CodeLevel::District => {
                let (Some(province_code), Some(regency_code)) =
                    (ctx.province_code.clone(), ctx.regency_code.clone())
                else {
                    trace!(page, code, "District row before province/regency context");
                    continue;
                };
                let Some(name) = normalize_name(cell(row, columns.name)) else {
                    continue;
                };
                out.push(RawDistrict {
                    code: canonical(code),
                    province_code,
                    regency_code,
                    name,
                    province_capital: ctx.province_capital.clone(),
                    regency_capital: ctx.regency_capital.clone(),
                    source_page: page,
                });
            }
            _ => {}
        }
    }

    (out, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    fn row(cells: &[Option<&str>]) -> Row {
        cells.iter().map(|c| c.map(|s| s.to_string())).collect()
    }

    #[test]
    fn markers_set_context_for_leaf_row() {
        let table = vec![
            row(&[Some("1"), Some("11"), Some("ACEH"), Some("Banda Aceh")]),
            row(&[Some("1"), Some("11.01"), Some("KAB. ACEH SELATAN"), Some("X")]),
            row(&[Some("1"), Some("11.01.01"), Some("1 Kuta Alam"), None]),
        ];
        let (rows, ctx) = parse_districts(&[table], 40, Context::default());
        assert_eq!(rows.len(), 1);
        let d = &rows[0];
        assert_eq!(d.code, "110101");
        assert_eq!(d.province_code, "11");
        assert_eq!(d.regency_code, "1101");
        assert_eq!(d.name, "Kuta Alam");
        assert_eq!(d.province_capital.as_deref(), Some("Banda Aceh"));
        assert_eq!(d.regency_capital.as_deref(), Some("X"));
        assert_eq!(ctx.regency_code.as_deref(), Some("1101"));
    }

    // Codes are province NN, regency NN.NN, district NN.NN.NN; there is no
    // eight digit level, so a 4/6/8 digit marker-marker-leaf sequence emits
    // nothing.
    #[test]
    fn eight_digit_codes_are_not_districts() {
        let table = vec![
            row(&[Some("1"), Some("1101"), Some("ACEH"), Some("Banda Aceh")]),
            row(&[Some("1"), Some("110101"), Some("ACEH SELATAN"), Some("X")]),
            row(&[Some("1"), Some("11010101"), Some("1 Kuta Alam"), None]),
        ];
        let (rows, ctx) = parse_districts(&[table], 40, Context::default());
        assert!(rows.is_empty());
        assert_eq!(ctx.province_code, None);
        assert_eq!(ctx.regency_code.as_deref(), Some("1101"));
    }

    #[test]
    fn rows_before_context_are_dropped() {
        let table = vec![
            row(&[Some("1"), Some("11.01.01"), Some("Bakongan"), None]),
            row(&[Some("1"), Some("11.01"), Some("ACEH SELATAN"), Some("Tapaktuan")]),
            row(&[Some("2"), Some("11.01.02"), Some("Kluet Utara"), None]),
        ];
        let (rows, _) = parse_districts(&[table], 1, Context::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn carried_context_serves_continuation_page() {
        let ctx = Context {
            province_code: Some("11".to_string()),
            province_capital: Some("Banda Aceh".to_string()),
            regency_code: Some("1101".to_string()),
            regency_capital: Some("Tapaktuan".to_string()),
            district_code: None,
        };
        let table = vec![row(&[Some("3"), Some("11.01.03"), Some("Kluet Selatan"), None])];
        let (rows, _) = parse_districts(&[table], 41, ctx);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].regency_capital.as_deref(), Some("Tapaktuan"));
        assert_eq!(rows[0].source_page, 41);
    }

    #[test]
    fn province_row_resets_regency() {
        let ctx = Context {
            province_code: Some("11".to_string()),
            regency_code: Some("1101".to_string()),
            regency_capital: Some("Tapaktuan".to_string()),
            ..Context::default()
        };
        let table = vec![
            row(&[Some("2"), Some("12"), Some("SUMATERA UTARA"), Some("Medan")]),
            row(&[Some("1"), Some("12.01.01"), Some("Barus"), None]),
        ];
        let (rows, ctx) = parse_districts(&[table], 1, ctx);
        assert!(rows.is_empty());
        assert_eq!(ctx.province_code.as_deref(), Some("12"));
        assert_eq!(ctx.province_capital.as_deref(), Some("Medan"));
        assert_eq!(ctx.regency_code, None);
    }

    #[test]
    fn header_columns_are_detected() {
        let table = vec![
            row(&[Some("KODE"), Some("NO"), Some("IBUKOTA"), Some("NAMA KECAMATAN")]),
            row(&[Some("11"), None, Some("Banda Aceh"), Some("ACEH")]),
            row(&[Some("11.71"), None, Some("Banda Aceh"), Some("KOTA BANDA ACEH")]),
            row(&[Some("11.71.01"), Some("1"), None, Some("Meuraxa")]),
        ];
        let (rows, _) = parse_districts(&[table], 1, Context::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Meuraxa");
        assert_eq!(rows[0].regency_capital.as_deref(), Some("Banda Aceh"));
    }

    #[test]
    fn short_rows_are_skipped() {
        let table = vec![row(&[Some("1")]), row(&[])];
        let (rows, ctx) = parse_districts(&[table], 1, Context::default());
        assert!(rows.is_empty());
        assert_eq!(ctx, Context::default());
    }
}
