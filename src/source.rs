use crate::models::Table;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Per-page access to extracted tables and plain text.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Ordered tables of `page`. Only the first one feeds the classifier.
    fn tables(&mut self, page: usize) -> Result<Vec<Table>>;

    /// Plain text of `page`, used by the text-based regency strategy.
    fn text(&mut self, page: usize) -> Result<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PageDumpFile {
    pages: Vec<PageContent>,
}

/// JSON page dump written by an external table extractor:
/// `{"pages": [{"tables": [[[cell, ...], ...]], "text": "..."}, ...]}`
pub struct PageDump {
    pages: Vec<PageContent>,
}

impl PageDump {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open page dump: {}", path.display()))?;
        let reader = BufReader::with_capacity(256 * 1024, file);
        let dump: PageDumpFile = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to decode page dump: {}", path.display()))?;

        info!(pages = dump.pages.len(), path = %path.display(), "Page dump opened");

        Ok(Self { pages: dump.pages })
    }

    fn page(&self, page: usize) -> Result<&PageContent> {
        page_at(&self.pages, page)
    }
}

impl PageSource for PageDump {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tables(&mut self, page: usize) -> Result<Vec<Table>> {
        Ok(self.page(page)?.tables.clone())
    }

    fn text(&mut self, page: usize) -> Result<String> {
        Ok(self.page(page)?.text.clone())
    }
}

/// In-memory pages, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<PageContent>,
}

impl MemorySource {
    pub fn new(pages: Vec<PageContent>) -> Self {
        Self { pages }
    }

    pub fn from_tables(pages: Vec<Vec<Table>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|tables| PageContent {
                    tables,
                    text: String::new(),
                })
                .collect(),
        }
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tables(&mut self, page: usize) -> Result<Vec<Table>> {
        Ok(page_at(&self.pages, page)?.tables.clone())
    }

    fn text(&mut self, page: usize) -> Result<String> {
        Ok(page_at(&self.pages, page)?.text.clone())
    }
}

fn page_at(pages: &[PageContent], page: usize) -> Result<&PageContent> {
    if page == 0 || page > pages.len() {
        bail!("Page {} out of range (document has {} pages)", page, pages.len());
    }
    Ok(&pages[page - 1])
}
