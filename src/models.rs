use serde::{Deserialize, Serialize};

/// One extracted table cell; `None` where the extractor found no text
pub type Cell = Option<String>;
pub type Row = Vec<Cell>;
pub type Table = Vec<Row>;

/// Structural type of a page, decided from its first table's header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    Province,
    RegencyCity,
    District,
    Village,
    Unknown,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Province => "province",
            PageType::RegencyCity => "regency_city",
            PageType::District => "district",
            PageType::Village => "village",
            PageType::Unknown => "unknown",
        }
    }
}

/// Depth of a hierarchical code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeLevel {
    Province,
    Regency,
    District,
    Village,
    Other,
}

/// The four dataset levels, parent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Province,
    Regency,
    District,
    Village,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Province,
        Level::Regency,
        Level::District,
        Level::Village,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Province => "province",
            Level::Regency => "regency",
            Level::District => "district",
            Level::Village => "village",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegencyType {
    Regency,
    City,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VillageType {
    Village,
    UrbanVillage,
}

/// Ancestor state carried from one page to the next.
///
/// The runner keeps one per page type, created empty at the start of a run and
/// threaded from one page of that type to the next; parsers return the updated
/// value instead of mutating shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub province_code: Option<String>,
    pub province_capital: Option<String>,
    pub regency_code: Option<String>,
    pub regency_capital: Option<String>,
    pub district_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProvince {
    pub code: String,
    pub name: String,
    pub island_count: Option<String>,
    pub source_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRegency {
    pub code: String,
    pub province_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RegencyType,
    pub source_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDistrict {
    pub code: String,
    pub province_code: String,
    pub regency_code: String,
    pub name: String,
    pub province_capital: Option<String>,
    pub regency_capital: Option<String>,
    pub source_page: usize,
}

/// Village-level raw row. A row with `name == None` is a context marker
/// recording that the listing entered `district_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVillage {
    pub code: String,
    pub district_code: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<VillageType>,
    pub source_page: usize,
}

impl RawVillage {
    pub fn is_marker(&self) -> bool {
        self.name.is_none()
    }
}

/// Raw rows accumulated per level over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRows {
    pub provinces: Vec<RawProvince>,
    pub regencies: Vec<RawRegency>,
    pub districts: Vec<RawDistrict>,
    pub villages: Vec<RawVillage>,
}

impl RawRows {
    /// Rows stored for `level`, context markers included
    pub fn count(&self, level: Level) -> usize {
        match level {
            Level::Province => self.provinces.len(),
            Level::Regency => self.regencies.len(),
            Level::District => self.districts.len(),
            Level::Village => self.villages.len(),
        }
    }

    /// Rows that describe a region of `level`; village context markers are
    /// not counted
    pub fn region_count(&self, level: Level) -> usize {
        match level {
            Level::Village => self.villages.iter().filter(|v| !v.is_marker()).count(),
            _ => self.count(level),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub code: String,
    pub name: String,
    pub capital: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regency {
    pub code: String,
    pub province_code: String,
    pub name: String,
    pub capital: Option<String>,
    #[serde(rename = "type")]
    pub kind: RegencyType,
    pub is_administrative: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub code: String,
    pub regency_code: String,
    #[serde(skip_serializing)]
    pub province_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Village {
    pub code: String,
    pub district_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VillageType,
}

/// One flat record per village with every resolved ancestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageFull {
    pub village_code: String,
    pub village_name: String,
    pub village_type: VillageType,
    pub district_code: String,
    pub district_name: String,
    pub regency_code: String,
    pub regency_name: String,
    pub regency_type: RegencyType,
    pub regency_capital: Option<String>,
    pub regency_is_administrative: bool,
    pub province_code: String,
    pub province_name: String,
    pub province_capital: Option<String>,
}

/// The validated output of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub provinces: Vec<Province>,
    pub regencies: Vec<Regency>,
    pub districts: Vec<District>,
    pub villages: Vec<Village>,
    pub joined: Vec<VillageFull>,
}
