use crate::code::classify_code;
use crate::config::{FK_SAMPLE_SIZE, MIN_DISTRICTS, MIN_PROVINCES, MIN_REGENCIES, MIN_VILLAGES};
use crate::error::IntegrityError;
use crate::models::{
    CodeLevel, Dataset, District, Level, Province, RawDistrict, RawProvince, RawRegency, RawRows,
    RawVillage, Regency, Village, VillageFull,
};
use crate::text::collapse_whitespace;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Minimum raw row counts per level; anything lower means classification or
/// routing went broadly wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanityThresholds {
    pub min_provinces: usize,
    pub min_regencies: usize,
    pub min_districts: usize,
    pub min_villages: usize,
}

impl Default for SanityThresholds {
    fn default() -> Self {
        Self {
            min_provinces: MIN_PROVINCES,
            min_regencies: MIN_REGENCIES,
            min_districts: MIN_DISTRICTS,
            min_villages: MIN_VILLAGES,
        }
    }
}

impl SanityThresholds {
    pub fn minimum(&self, level: Level) -> usize {
        match level {
            Level::Province => self.min_provinces,
            Level::Regency => self.min_regencies,
            Level::District => self.min_districts,
            Level::Village => self.min_villages,
        }
    }
}

pub fn check_sanity(raw: &RawRows, thresholds: &SanityThresholds) -> Result<(), IntegrityError> {
    for level in Level::ALL {
        let count = raw.region_count(level);
        let minimum = thresholds.minimum(level);
        debug!(level = level.as_str(), count, minimum, "Sanity count");
        if count < minimum {
            return Err(IntegrityError::SanityCount {
                level: level.as_str(),
                count,
                minimum,
            });
        }
    }
    Ok(())
}

/// Capital of a parent from the distinct non-null capitals of its children.
pub fn derive_capital(
    label: &'static str,
    code: &str,
    capitals: &BTreeSet<String>,
) -> Result<Option<String>, IntegrityError> {
    match capitals.len() {
        0 => Ok(None),
        1 => Ok(capitals.iter().next().cloned()),
        _ => Err(IntegrityError::AmbiguousCapital {
            label,
            code: code.to_string(),
            capitals: capitals.iter().cloned().collect(),
        }),
    }
}

fn capitals_by<'a>(
    districts: &'a [RawDistrict],
    parent: impl Fn(&'a RawDistrict) -> &'a str,
    capital: impl Fn(&'a RawDistrict) -> Option<&'a str>,
) -> FxHashMap<&'a str, BTreeSet<String>> {
    let mut grouped: FxHashMap<&str, BTreeSet<String>> = FxHashMap::default();
    for d in districts {
        if let Some(c) = capital(d).filter(|c| !c.is_empty()) {
            grouped.entry(parent(d)).or_default().insert(c.to_string());
        }
    }
    grouped
}

fn capital_for(
    grouped: &FxHashMap<&str, BTreeSet<String>>,
    label: &'static str,
    code: &str,
) -> Result<Option<String>, IntegrityError> {
    match grouped.get(code) {
        Some(capitals) => derive_capital(label, code, capitals),
        None => Ok(None),
    }
}

pub fn assert_unique<T>(
    rows: &[T],
    key: impl Fn(&T) -> &str,
    label: &'static str,
) -> Result<(), IntegrityError> {
    let mut seen = FxHashSet::default();
    for row in rows {
        let value = key(row);
        if !seen.insert(value) {
            return Err(IntegrityError::DuplicateKey {
                label,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Every child's parent key must exist among the parents. The error carries a
/// bounded, sorted sample of the known parent keys.
pub fn assert_fk<C, P>(
    children: &[C],
    child_key: &'static str,
    child_value: impl Fn(&C) -> &str,
    parents: &[P],
    parent_value: impl Fn(&P) -> &str,
    label: &'static str,
) -> Result<(), IntegrityError> {
    let known: FxHashSet<&str> = parents.iter().map(&parent_value).collect();
    for child in children {
        let value = child_value(child);
        if !known.contains(value) {
            let sorted: BTreeSet<&str> = known.iter().copied().collect();
            return Err(IntegrityError::ForeignKey {
                label,
                child_key,
                value: value.to_string(),
                parent_key: "code",
                sample: sorted
                    .into_iter()
                    .take(FK_SAMPLE_SIZE)
                    .map(str::to_string)
                    .collect(),
            });
        }
    }
    Ok(())
}

pub fn normalize_districts(raw: &[RawDistrict]) -> Result<Vec<District>, IntegrityError> {
    let mut out: Vec<District> = raw
        .iter()
        .map(|d| District {
            code: d.code.clone(),
            regency_code: d.regency_code.clone(),
            province_code: d.province_code.clone(),
            name: d.name.clone(),
        })
        .collect();
    assert_unique(&out, |d| d.code.as_str(), "district")?;
    out.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(out)
}

/// Strips the administrative infix into a flag and expands an abbreviated
/// regency prefix: `"Kab. Adm. Kepulauan Seribu"` -> `("Kabupaten Kepulauan Seribu", true)`.
pub fn normalize_regency_name(name: &str) -> (String, bool) {
    let mut administrative = false;
    let mut tokens: Vec<&str> = Vec::new();

    for (i, token) in name.split_whitespace().enumerate() {
        let upper = token.to_uppercase();
        if upper == "ADMINISTRASI" || upper == "ADM." || upper == "ADM" {
            administrative = true;
            continue;
        }
        if i == 0 && (upper == "KAB." || upper == "KAB") {
            tokens.push("Kabupaten");
            continue;
        }
        tokens.push(token);
    }

    (tokens.join(" "), administrative)
}

pub fn normalize_regencies(
    raw: &[RawRegency],
    raw_districts: &[RawDistrict],
) -> Result<Vec<Regency>, IntegrityError> {
    let grouped = capitals_by(
        raw_districts,
        |d| d.regency_code.as_str(),
        |d| d.regency_capital.as_deref(),
    );

    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        let (name, is_administrative) = normalize_regency_name(&r.name);
        out.push(Regency {
            code: r.code.clone(),
            province_code: r.province_code.clone(),
            name,
            capital: capital_for(&grouped, "regency", &r.code)?,
            kind: r.kind,
            is_administrative,
        });
    }
    assert_unique(&out, |r| r.code.as_str(), "regency")?;
    out.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(out)
}

pub fn normalize_provinces(
    raw: &[RawProvince],
    raw_districts: &[RawDistrict],
) -> Result<Vec<Province>, IntegrityError> {
    let grouped = capitals_by(
        raw_districts,
        |d| d.province_code.as_str(),
        |d| d.province_capital.as_deref(),
    );

    let mut out = Vec::with_capacity(raw.len());
    for p in raw {
        out.push(Province {
            code: p.code.clone(),
            name: collapse_whitespace(&p.name),
            capital: capital_for(&grouped, "province", &p.code)?,
        });
    }
    assert_unique(&out, |p| p.code.as_str(), "province")?;
    out.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(out)
}

/// Drops context markers, keeping only named village-level rows.
pub fn normalize_villages(raw: &[RawVillage]) -> Result<Vec<Village>, IntegrityError> {
    let mut out = Vec::with_capacity(raw.len());
    for v in raw {
        let (Some(name), Some(kind)) = (v.name.as_ref(), v.kind) else {
            continue;
        };
        if classify_code(&v.code) != CodeLevel::Village {
            continue;
        }
        out.push(Village {
            code: v.code.clone(),
            district_code: v.district_code.clone(),
            name: name.clone(),
            kind,
        });
    }
    assert_unique(&out, |v| v.code.as_str(), "village")?;
    out.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(out)
}

/// Flattens every village with its ancestors. Villages with an unresolved
/// ancestor are left out of the join only.
pub fn build_join(
    provinces: &[Province],
    regencies: &[Regency],
    districts: &[District],
    villages: &[Village],
) -> Vec<VillageFull> {
    let provinces: FxHashMap<&str, &Province> =
        provinces.iter().map(|p| (p.code.as_str(), p)).collect();
    let regencies: FxHashMap<&str, &Regency> =
        regencies.iter().map(|r| (r.code.as_str(), r)).collect();
    let districts: FxHashMap<&str, &District> =
        districts.iter().map(|d| (d.code.as_str(), d)).collect();

    villages
        .iter()
        .filter_map(|v| {
            let d = districts.get(v.district_code.as_str())?;
            let r = regencies.get(d.regency_code.as_str())?;
            let p = provinces.get(r.province_code.as_str())?;
            Some(VillageFull {
                village_code: v.code.clone(),
                village_name: v.name.clone(),
                village_type: v.kind,
                district_code: d.code.clone(),
                district_name: d.name.clone(),
                regency_code: r.code.clone(),
                regency_name: r.name.clone(),
                regency_type: r.kind,
                regency_capital: r.capital.clone(),
                regency_is_administrative: r.is_administrative,
                province_code: p.code.clone(),
                province_name: p.name.clone(),
                province_capital: p.capital.clone(),
            })
        })
        .collect()
}

/// Normalizes, validates and joins the raw rows.
pub fn build_dataset(raw: &RawRows) -> Result<Dataset, IntegrityError> {
    let districts = normalize_districts(&raw.districts)?;
    let regencies = normalize_regencies(&raw.regencies, &raw.districts)?;
    let provinces = normalize_provinces(&raw.provinces, &raw.districts)?;
    let villages = normalize_villages(&raw.villages)?;

    assert_fk(
        &regencies,
        "province_code",
        |r| r.province_code.as_str(),
        &provinces,
        |p| p.code.as_str(),
        "regency",
    )?;
    assert_fk(
        &districts,
        "regency_code",
        |d| d.regency_code.as_str(),
        &regencies,
        |r| r.code.as_str(),
        "district",
    )?;
    assert_fk(
        &villages,
        "district_code",
        |v| v.district_code.as_str(),
        &districts,
        |d| d.code.as_str(),
        "village",
    )?;

    let joined = build_join(&provinces, &regencies, &districts, &villages);

    info!(
        provinces = provinces.len(),
        regencies = regencies.len(),
        districts = districts.len(),
        villages = villages.len(),
        joined = joined.len(),
        "Dataset built"
    );

    Ok(Dataset {
        provinces,
        regencies,
        districts,
        villages,
        joined,
    })
}
