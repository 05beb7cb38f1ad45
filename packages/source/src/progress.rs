//! Download progress for flight log fetches.
//!
//! Fetchers report what they learn about a download (how many rows the
//! service claims to hold, each page as it lands, the final row count)
//! through [`FetchProgress`]. The CLI renders that as a bar; library
//! callers and tests pass [`Silent`].

use std::sync::Arc;

/// Observer for one flight log download.
pub trait FetchProgress: Send + Sync {
    /// The service reported `rows` matching rows before paging started.
    fn rows_expected(&self, rows: u64);

    /// A page of `rows` rows arrived from `endpoint`.
    fn page_received(&self, endpoint: &str, rows: u64);

    /// Paging finished for `source` with `rows` raw rows in hand.
    fn finished(&self, source: &str, rows: u64);
}

/// Discards every progress event.
pub struct Silent;

impl FetchProgress for Silent {
    fn rows_expected(&self, _rows: u64) {}
    fn page_received(&self, _endpoint: &str, _rows: u64) {}
    fn finished(&self, _source: &str, _rows: u64) {}
}

/// A shared [`Silent`] observer.
#[must_use]
pub fn silent() -> Arc<dyn FetchProgress> {
    Arc::new(Silent)
}
