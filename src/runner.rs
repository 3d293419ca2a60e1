use crate::classifier::classify_page;
use crate::models::{Context, Level, PageType, RawRows, Table};
use crate::parsers::{
    parse_districts, parse_provinces, parse_regencies_table, parse_regencies_text,
    parse_villages, NamePolicy, RegencyStrategy,
};
use crate::source::PageSource;
use crate::stats::RunStats;
use anyhow::{Context as _, Result};
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

/// Observes (pages processed, pages in range). Must not influence parsing.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);

/// `Seeking` until the first province page, `InListing` afterwards, and
/// `Stopped` at the first unknown page once the listing has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    Seeking,
    InListing,
    Stopped,
}

impl ListingState {
    /// Transition on a page's raw classification
    pub fn advance(self, page_type: PageType) -> Self {
        match (self, page_type) {
            (ListingState::Seeking, PageType::Province) => ListingState::InListing,
            (ListingState::InListing, PageType::Unknown) => ListingState::Stopped,
            (state, _) => state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// First page to visit, 1-based
    pub start_page: usize,
    /// Last page to visit; clamped to the document length
    pub end_page: Option<usize>,
    pub regency_strategy: RegencyStrategy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: None,
            regency_strategy: RegencyStrategy::default(),
        }
    }
}

impl ExtractOptions {
    /// Inclusive page range to visit, or `None` when it is empty
    pub fn page_range(&self, page_count: usize) -> Option<(usize, usize)> {
        let start = self.start_page.max(1);
        let end = self.end_page.unwrap_or(page_count).min(page_count);
        if start > end {
            None
        } else {
            Some((start, end))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub raw: RawRows,
    pub stats: RunStats,
    pub state: ListingState,
}

fn report(progress: &mut Option<ProgressFn<'_>>, done: usize, total: usize) {
    if let Some(cb) = progress {
        cb(done, total);
    }
}

/// Visits the page range, classifying and parsing each page and accumulating
/// raw rows per level.
pub fn run_extraction(
    source: &mut dyn PageSource,
    options: &ExtractOptions,
    policy: &dyn NamePolicy,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<Extraction> {
    let mut raw = RawRows::default();
    let mut stats = RunStats::new();
    let mut state = ListingState::Seeking;

    let Some((start, end)) = options.page_range(source.page_count()) else {
        info!(pages = source.page_count(), "Page range is empty");
        return Ok(Extraction { raw, stats, state });
    };
    let total = end - start + 1;

    info!(start, end, strategy = options.regency_strategy.as_str(), "Starting page iteration");

    // Each page type continues from the context left by the last page of the
    // same type.
    let mut contexts: FxHashMap<PageType, Context> = FxHashMap::default();
    let mut last_type: Option<PageType> = None;

    for (done, page) in (start..=end).enumerate() {
        let tables = source
            .tables(page)
            .with_context(|| format!("Failed to extract tables from page {}", page))?;

        let page_type = classify_page(&tables);
        stats.record_page(page_type);
        debug!(page, page_type = page_type.as_str(), tables = tables.len(), "Page classified");
        if let Some(header) = tables.first().and_then(|t| t.first()) {
            trace!(page, header = ?header, "Header row");
        }

        state = state.advance(page_type);
        if state == ListingState::Stopped {
            info!(page, "Unknown page after the listing started, stopping");
            stats.stopped_at = Some(page);
            report(&mut progress, done + 1, total);
            break;
        }

        let dispatch = match (page_type, last_type) {
            (PageType::Unknown, Some(previous)) => {
                debug!(page, fallback = previous.as_str(), "Dispatching unknown page as previous type");
                stats.inc_fallback();
                previous
            }
            (PageType::Unknown, None) => {
                report(&mut progress, done + 1, total);
                continue;
            }
            (known, _) => known,
        };

        let ctx = contexts.remove(&dispatch).unwrap_or_default();
        let ctx = dispatch_page(
            dispatch,
            source,
            &tables,
            page,
            ctx,
            options.regency_strategy,
            policy,
            &mut raw,
            &mut stats,
        )?;
        contexts.insert(dispatch, ctx);
        last_type = Some(dispatch);

        report(&mut progress, done + 1, total);
    }

    info!(
        pages = stats.pages_visited,
        provinces = raw.provinces.len(),
        regencies = raw.regencies.len(),
        districts = raw.districts.len(),
        villages = raw.villages.len(),
        "Page iteration complete"
    );

    Ok(Extraction { raw, stats, state })
}

#[allow(clippy::too_many_arguments)]
fn dispatch_page(
    page_type: PageType,
    source: &mut dyn PageSource,
    tables: &[Table],
    page: usize,
    ctx: Context,
    strategy: RegencyStrategy,
    policy: &dyn NamePolicy,
    raw: &mut RawRows,
    stats: &mut RunStats,
) -> Result<Context> {
    let ctx = match page_type {
        PageType::Province => {
            let (rows, ctx) = parse_provinces(tables, page, ctx);
            debug!(page, rows = rows.len(), "Provinces parsed");
            stats.add_rows(Level::Province, rows.len());
            raw.provinces.extend(rows);
            ctx
        }
        PageType::RegencyCity => {
            let (rows, ctx) = match strategy {
                RegencyStrategy::Table => parse_regencies_table(tables, page, ctx),
                RegencyStrategy::Text => {
                    let text = page_text(source, page)?;
                    parse_regencies_text(&text, page, ctx, policy)
                }
                RegencyStrategy::Auto => {
                    let (rows, ctx) = parse_regencies_table(tables, page, ctx);
                    if rows.is_empty() {
                        debug!(page, "No regency rows in tables, reading page text");
                        stats.inc_text_fallback();
                        let text = page_text(source, page)?;
                        parse_regencies_text(&text, page, ctx, policy)
                    } else {
                        (rows, ctx)
                    }
                }
            };
            debug!(page, rows = rows.len(), "Regencies parsed");
            stats.add_rows(Level::Regency, rows.len());
            raw.regencies.extend(rows);
            ctx
        }
        PageType::District => {
            let (rows, ctx) = parse_districts(tables, page, ctx);
            debug!(page, rows = rows.len(), "Districts parsed");
            stats.add_rows(Level::District, rows.len());
            raw.districts.extend(rows);
            ctx
        }
        PageType::Village => {
            let (rows, ctx) = parse_villages(tables, page, ctx);
            debug!(page, rows = rows.len(), "Villages parsed");
            stats.add_rows(Level::Village, rows.len());
            raw.villages.extend(rows);
            ctx
        }
        PageType::Unknown => ctx,
    };
    Ok(ctx)
}

fn page_text(source: &mut dyn PageSource, page: usize) -> Result<String> {
    source
        .text(page)
        .with_context(|| format!("Failed to extract text from page {}", page))
}

/// Raw classification of every page in range, without parsing or stopping.
pub fn classify_pages(
    source: &mut dyn PageSource,
    options: &ExtractOptions,
) -> Result<Vec<(usize, PageType)>> {
    let Some((start, end)) = options.page_range(source.page_count()) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(end - start + 1);
    for page in start..=end {
        let tables = source
            .tables(page)
            .with_context(|| format!("Failed to extract tables from page {}", page))?;
        out.push((page, classify_page(&tables)));
    }
    Ok(out)
}
