/// Bumped whenever the raw row layout changes so stale caches are rejected
pub const CACHE_VERSION: u32 = 1;

/// Side cache directory (relative to the output directory)
pub const RAW_CACHE_DIR: &str = ".raw_cache";

/// Bincode manifest describing the cached raw rows
pub const RAW_CACHE_MANIFEST: &str = "manifest.bin";

/// Download target directory for remote inputs (relative to the output directory)
pub const DOWNLOAD_DIR: &str = ".source";

/// Maximum number of known parent keys reported by a foreign key failure
pub const FK_SAMPLE_SIZE: usize = 10;

/// Minimum plausible raw row counts, checked before building
pub const MIN_PROVINCES: usize = 30;
pub const MIN_REGENCIES: usize = 500;
pub const MIN_DISTRICTS: usize = 1;
pub const MIN_VILLAGES: usize = 1;

/// Default column layout of district pages without a recognizable header
pub const DISTRICT_CODE_COL: usize = 1;
pub const DISTRICT_NAME_COL: usize = 2;
pub const DISTRICT_CAPITAL_COL: usize = 3;

/// Village table columns: code, urban (kelurahan) name, rural (desa) name
pub const VILLAGE_CODE_COL: usize = 0;
pub const VILLAGE_URBAN_COL: usize = 5;
pub const VILLAGE_RURAL_COL: usize = 6;
pub const VILLAGE_MIN_COLS: usize = 7;

/// Buffer size for CSV writers
pub const CSV_BUFFER_SIZE: usize = 128 * 1024;

/// Final output file names
pub const PROVINCE_CSV: &str = "province.csv";
pub const REGENCY_CSV: &str = "regency.csv";
pub const DISTRICT_CSV: &str = "district.csv";
pub const VILLAGE_CSV: &str = "village.csv";
pub const VILLAGE_FULL_CSV: &str = "village_full.csv";
