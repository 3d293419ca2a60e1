use super::rows;
use crate::code::{canonical, classify_code};
use crate::models::{CodeLevel, Context, RawProvince, Table};
use crate::text::{cell, normalize_name, split_cell};
use tracing::trace;

/// Parses a province listing page.
///
/// One physical row may hold several provinces: the code and name cells carry
/// newline-separated lists aligned by position. The island count is read from
/// the last column. A sub-row whose name or island count is missing is skipped
/// without dropping its siblings.
pub fn parse_provinces(
    tables: &[Table],
    page: usize,
    ctx: Context,
) -> (Vec<RawProvince>, Context) {
    let mut out = Vec::new();

    for row in rows(tables) {
        if row.len() < 3 {
            continue;
        }

        let codes = split_cell(cell(row, 1));
        let names = split_cell(cell(row, 2));
        if codes.is_empty() || names.is_empty() {
            continue;
        }

        let islands = if row.len() > 3 {
            Some(split_cell(cell(row, row.len() - 1)))
        } else {
            None
        };

        for (i, code) in codes.iter().enumerate() {
            if classify_code(code) != CodeLevel::Province {
                continue;
            }
            let Some(name) = names.get(i).and_then(|n| normalize_name(Some(n.as_str()))) else {
                trace!(page, code = %code, "Province sub-row without name");
                continue;
            };
            let island_count = match &islands {
                Some(values) => match values.get(i) {
                    Some(v) => Some(v.clone()),
                    None => {
                        trace!(page, code = %code, "Province sub-row without island count");
                        continue;
                    }
                },
                None => None,
            };

            out.push(RawProvince {
                code: canonical(code),
                name,
                island_count,
                source_page: page,
            });
        }
    }

    (out, ctx)
}
