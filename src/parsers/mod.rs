pub mod district;
pub mod province;
pub mod regency;
pub mod village;

pub use district::parse_districts;
pub use province::parse_provinces;
pub use regency::{
    parse_regencies_table, parse_regencies_text, DefaultNamePolicy, NamePolicy, RegencyStrategy,
};
pub use village::parse_villages;

use crate::models::{Row, Table};

/// Every row of every table on a page, in order.
pub(crate) fn rows(tables: &[Table]) -> impl Iterator<Item = &Row> {
    tables.iter().flat_map(|table| table.iter())
}
