use super::rows;
use crate::code::{canonical, classify_code};
use crate::config::{VILLAGE_CODE_COL, VILLAGE_MIN_COLS, VILLAGE_RURAL_COL, VILLAGE_URBAN_COL};
use crate::models::{CodeLevel, Context, RawVillage, Table, VillageType};
use crate::text::{cell, cell_text, normalize_name};
use tracing::trace;

/// Parses a village listing page.
///
/// A district row switches the carried district and is emitted as a marker row
/// (no name) so district transitions stay visible across pages. Village rows
/// take their name from the urban (kelurahan) and rural (desa) columns.
pub fn parse_villages(
    tables: &[Table],
    page: usize,
    mut ctx: Context,
) -> (Vec<RawVillage>, Context) {
    let mut out = Vec::new();

    for row in rows(tables) {
        if row.len() < VILLAGE_MIN_COLS {
            continue;
        }

        let code = cell_text(row, VILLAGE_CODE_COL);

        match classify_code(code) {
            CodeLevel::Province | CodeLevel::Regency => {
                ctx.district_code = None;
            }
            CodeLevel::District => {
                let district_code = canonical(code);
                ctx.district_code = Some(district_code.clone());
                out.push(RawVillage {
                    code: district_code.clone(),
                    district_code,
                    name: None,
                    kind: None,
                    source_page: page,
                });
            }
            CodeLevel::Village => {
                let Some(district_code) = ctx.district_code.clone() else {
                    trace!(page, code, "Village row before district context");
                    continue;
                };
                let urban = normalize_name(cell(row, VILLAGE_URBAN_COL));
                let rural = normalize_name(cell(row, VILLAGE_RURAL_COL));
                let (name, kind) = match (urban, rural) {
                    (Some(u), Some(r)) => (format!("{} {}", u, r), VillageType::Village),
                    (Some(u), None) => (u, VillageType::UrbanVillage),
                    (None, Some(r)) => (r, VillageType::Village),
                    (None, None) => continue,
                };
                out.push(RawVillage {
                    code: canonical(code),
                    district_code,
                    name: Some(name),
                    kind: Some(kind),
                    source_page: page,
                });
            }
            CodeLevel::Other => {}
        }
    }

    (out, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    fn row(code: &str, urban: Option<&str>, rural: Option<&str>) -> Row {
        vec![
            Some(code.to_string()),
            None,
            None,
            None,
            None,
            urban.map(|s| s.to_string()),
            rural.map(|s| s.to_string()),
        ]
    }

    #[test]
    fn district_row_emits_marker_and_sets_context() {
        let table = vec![
            row("11.01.01", Some("BAKONGAN"), None),
            row("11.01.01.2001", None, Some("1 Keude Bakongan")),
        ];
        let (rows, ctx) = parse_villages(&[table], 100, Context::default());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_marker());
        assert_eq!(rows[0].code, "110101");
        assert_eq!(rows[1].code, "1101012001");
        assert_eq!(rows[1].district_code, "110101");
        assert_eq!(rows[1].name.as_deref(), Some("Keude Bakongan"));
        assert_eq!(rows[1].kind, Some(VillageType::Village));
        assert_eq!(ctx.district_code.as_deref(), Some("110101"));
    }

    #[test]
    fn name_columns_decide_type() {
        let ctx = Context {
            district_code: Some("117101".to_string()),
            ..Context::default()
        };
        let table = vec![
            row("11.71.01.1001", Some("Lampaseh Kota"), None),
            row("11.71.01.2001", None, Some("Ulee Lheue")),
            row("11.71.01.2002", Some("Alue"), Some("Deah Teungoh")),
            row("11.71.01.2003", None, None),
        ];
        let (rows, _) = parse_villages(&[table], 1, ctx);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, Some(VillageType::UrbanVillage));
        assert_eq!(rows[1].kind, Some(VillageType::Village));
        assert_eq!(rows[2].kind, Some(VillageType::Village));
        assert_eq!(rows[2].name.as_deref(), Some("Alue Deah Teungoh"));
    }

    #[test]
    fn village_without_district_context_is_dropped() {
        let table = vec![row("11.01.01.2001", None, Some("Keude Bakongan"))];
        let (rows, _) = parse_villages(&[table], 1, Context::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn short_and_header_rows_are_skipped() {
        let table = vec![
            vec![Some("11.01.01.2001".to_string()), Some("X".to_string())],
            row("KODE", Some("KELURAHAN"), Some("DESA")),
        ];
        let ctx = Context {
            district_code: Some("110101".to_string()),
            ..Context::default()
        };
        let (rows, _) = parse_villages(&[table], 1, ctx);
        assert!(rows.is_empty());
    }

    #[test]
    fn regency_row_closes_district() {
        let ctx = Context {
            district_code: Some("110101".to_string()),
            ..Context::default()
        };
        let table = vec![
            row("11.02", None, None),
            row("11.02.01.2001", None, Some("Lawe Sigala")),
        ];
        let (rows, ctx) = parse_villages(&[table], 1, ctx);
        assert!(rows.is_empty());
        assert_eq!(ctx.district_code, None);
    }
}
