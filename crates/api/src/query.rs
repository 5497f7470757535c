//! Query parameter types for list endpoints.

use serde::Deserialize;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Largest offset a store can be asked for (the SQL `OFFSET` is a signed
/// 64-bit integer).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pagination parameters (`?page=&recordPerPage=&startIndex=`).
///
/// Values arrive as raw strings so that garbage input falls back to the
/// defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    #[serde(rename = "recordPerPage")]
    pub record_per_page: Option<String>,
    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
}

impl PageParams {
    /// Resolve into `(offset, limit)`.
    ///
    /// `page` defaults to 1 and `recordPerPage` to [`DEFAULT_PAGE_SIZE`] when
    /// absent, unparsable, or below 1. A valid `startIndex` replaces the
    /// offset derived from `page`. Offsets never exceed [`MAX_OFFSET`].
    pub fn resolve(&self) -> (u64, u64) {
        let limit = parse_positive(self.record_per_page.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);

        let offset = self
            .start_index
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v <= MAX_OFFSET)
            .unwrap_or_else(|| (page - 1).saturating_mul(limit).min(MAX_OFFSET));

        (offset, limit)
    }
}
