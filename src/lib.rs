//! Wilayah: Indonesian administrative gazetteer extraction
//!
//! This crate turns the page tables of the Ministry of Home Affairs region code
//! decree into four normalized, cross-referenced datasets (province, regency/city,
//! district, village) plus one denormalized village join:
//!
//! 1. **Extraction Pass** -- Visit pages in order, classify each page from its
//!    header row, and route its tables to the matching parser while carrying
//!    ancestor context (province, regency, district) across pages
//! 2. **Raw Cache** -- Persist raw rows per level so the build can be rerun
//!    without rescanning the document
//! 3. **Build Pass** -- Normalize, derive capitals from district rows, enforce
//!    uniqueness and foreign keys, and join villages with their ancestors
//! 4. **Output** -- Publish five CSV files only after every check has passed
//!
//! # Architecture
//!
//! - **Ordered rule list** -- Page classification is a prioritized list of
//!   (predicate, page type) pairs
//! - **Threaded context** -- Parsers take the [`models::Context`] left by the
//!   last page of the same type and return the updated one; there is no shared
//!   mutable state
//! - **Sticky fallback** -- A page whose header is unrecognized is parsed as the
//!   previous page type, and ends the run once the listing has started
//! - **Strict build** -- Integrity failures are typed ([`error::IntegrityError`])
//!   and abort the run before any output is written
//!
//! # Key Modules
//!
//! - [`classifier`] -- Page classification from header tokens
//! - [`code`] -- Hierarchical code levels and canonical forms
//! - [`parsers`] -- Province, regency/city, district and village parsers
//! - [`runner`] -- Page iteration state machine
//! - [`builder`] -- Normalization, capital derivation and integrity checks
//! - [`cache`] -- Raw row cache for the reuse-raw fast path
//! - [`sink`] -- Atomic CSV output
//! - [`source`] -- Page providers (JSON page dump, in-memory pages)
//! - [`input`] -- Local or downloaded input with SHA-256 verification
//! - [`pipeline`] -- Run configuration and entry point
//! - [`stats`] -- Per-run counters
//! - [`config`] -- Constants for extraction, caching and output
//!
//! # Example Usage
//!
//! ```bash
//! # Extract from a page dump, pinning its hash
//! wilayah extract -i kepmendagri.json -o output/ --sha256 <hex>
//!
//! # Rebuild from the raw cache left by a failed run
//! wilayah extract -i kepmendagri.json -o output/ --reuse-raw
//!
//! # Inspect how pages 10-40 are classified
//! wilayah classify -i kepmendagri.json --start-page 10 --end-page 40
//! ```

pub mod builder;
pub mod cache;
pub mod classifier;
pub mod code;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod runner;
pub mod sink;
pub mod source;
pub mod stats;
pub mod text;
