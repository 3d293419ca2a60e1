use thiserror::Error;

/// Dataset-level integrity failures. Any of these aborts the run before output
/// is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("[{level}] implausibly few raw rows: {count} (expected at least {minimum})")]
    SanityCount {
        level: &'static str,
        count: usize,
        minimum: usize,
    },
    #[error("[{label}] duplicate code: {value}")]
    DuplicateKey { label: &'static str, value: String },
    #[error(
        "[{label}] invalid foreign key\n  {child_key} = {value}\n  known {parent_key}s (sample): {sample:?}"
    )]
    ForeignKey {
        label: &'static str,
        child_key: &'static str,
        value: String,
        parent_key: &'static str,
        sample: Vec<String>,
    },
    #[error("[{label}] multiple capitals for {code}: {capitals:?}")]
    AmbiguousCapital {
        label: &'static str,
        code: String,
        capitals: Vec<String>,
    },
}
