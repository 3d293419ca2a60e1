use crate::models::{Level, PageType, RawRows};

/// Counters collected while iterating pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_visited: u64,
    pub province_pages: u64,
    pub regency_pages: u64,
    pub district_pages: u64,
    pub village_pages: u64,
    pub unknown_pages: u64,
    pub fallback_pages: u64,
    pub text_fallback_pages: u64,
    pub stopped_at: Option<usize>,
    pub raw_provinces: u64,
    pub raw_regencies: u64,
    pub raw_districts: u64,
    pub raw_villages: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a visited page by its raw (pre-fallback) classification
    pub fn record_page(&mut self, page_type: PageType) {
        self.pages_visited += 1;
        match page_type {
            PageType::Province => self.province_pages += 1,
            PageType::RegencyCity => self.regency_pages += 1,
            PageType::District => self.district_pages += 1,
            PageType::Village => self.village_pages += 1,
            PageType::Unknown => self.unknown_pages += 1,
        }
    }

    pub fn inc_fallback(&mut self) {
        self.fallback_pages += 1;
    }

    pub fn inc_text_fallback(&mut self) {
        self.text_fallback_pages += 1;
    }

    pub fn add_rows(&mut self, level: Level, count: usize) {
        let count = count as u64;
        match level {
            Level::Province => self.raw_provinces += count,
            Level::Regency => self.raw_regencies += count,
            Level::District => self.raw_districts += count,
            Level::Village => self.raw_villages += count,
        }
    }

    /// Stats for a run that reused cached raw rows instead of reading pages
    pub fn from_raw(raw: &RawRows) -> Self {
        let mut stats = Self::new();
        for level in Level::ALL {
            stats.add_rows(level, raw.count(level));
        }
        stats
    }

    pub fn raw_rows(&self, level: Level) -> u64 {
        match level {
            Level::Province => self.raw_provinces,
            Level::Regency => self.raw_regencies,
            Level::District => self.raw_districts,
            Level::Village => self.raw_villages,
        }
    }
}
