use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FinderError, Result};

/// Page size used for every collection request
pub const PER_PAGE: u32 = 100;

/// Pagination headers of one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total_pages: u32,
    pub total: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            total_pages: 1,
            total: 0,
        }
    }
}

/// One undecoded page of a list endpoint
#[derive(Debug, Clone)]
pub struct RawPage {
    pub items: Vec<serde_json::Value>,
    pub info: PageInfo,
}

/// Transport for a single page of a list endpoint
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<RawPage>;
}

/// Receives progress while a collection is being fetched
pub trait FetchObserver: Send + Sync {
    fn progress(&self, label: &str, fetched: usize, total: u64);
    fn finish(&self);
}

impl FetchObserver for () {
    fn progress(&self, _label: &str, _fetched: usize, _total: u64) {}
    fn finish(&self) {}
}

/// Fetch every page of `endpoint`, in server order.
///
/// Stops once the page index reaches the `x-total-pages` value of the last
/// response. Any failure discards what was accumulated so far.
pub async fn fetch_all<T, S>(
    source: &S,
    endpoint: &str,
    query: &[(&str, String)],
    label: &str,
    observer: &dyn FetchObserver,
) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send,
    S: PageSource + ?Sized,
{
    let result = fetch_pages(source, endpoint, query, label, observer).await;
    observer.finish();
    result
}

async fn fetch_pages<T, S>(
    source: &S,
    endpoint: &str,
    query: &[(&str, String)],
    label: &str,
    observer: &dyn FetchObserver,
) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send,
    S: PageSource + ?Sized,
{
    let mut items: Vec<T> = Vec::new();
    let mut page = 1u32;

    loop {
        let raw = source.fetch_page(endpoint, query, page).await?;
        let received = raw.items.len();

        for value in raw.items {
            let item = serde_json::from_value(value).map_err(|e| FinderError::fetch(endpoint, e))?;
            items.push(item);
        }

        observer.progress(label, items.len(), raw.info.total);
        debug!(
            endpoint,
            page,
            received,
            total_pages = raw.info.total_pages,
            "fetched page"
        );

        if page >= raw.info.total_pages {
            break;
        }
        page += 1;
    }

    Ok(items)
}
