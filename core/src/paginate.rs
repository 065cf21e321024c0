//! Draining paged listings into complete, ordered item lists.
//!
//! The service pages its listings in two ways: saved tracks, playlists and
//! playlist items use an offset carried in the page envelope, while followed
//! artists use a cursor nested in the `artists` sub-object. Adapters normalise
//! both into [`Page`], so a single drain loop serves every listing.

use futures::stream::{self, Stream, TryStreamExt};
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Where the next page starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMarker {
    Offset(u32),
    Cursor(String),
}

/// Arguments of a single page fetch. `marker` is `None` for the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub marker: Option<PageMarker>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            marker: None,
        }
    }

    /// Offset to request; zero for the first page or for cursor markers.
    pub fn offset(&self) -> u32 {
        match self.marker {
            Some(PageMarker::Offset(offset)) => offset,
            _ => 0,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        match &self.marker {
            Some(PageMarker::Cursor(after)) => Some(after.as_str()),
            _ => None,
        }
    }
}

/// One page of a listing plus the continuation marker, `None` on the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageMarker>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

enum Step<T> {
    Ready(Page<T>),
    Fetch(PageMarker),
    Done,
}

/// Streams every item reachable from `first`, fetching follow-up pages
/// lazily with `fetch_next` until a page carries no marker.
pub fn page_stream<T, E, F, Fut>(
    first: Page<T>,
    limit: u32,
    fetch_next: F,
) -> impl Stream<Item = Result<T, E>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    stream::try_unfold(
        (Step::Ready(first), fetch_next),
        move |(step, mut fetch)| async move {
            let page = match step {
                Step::Ready(page) => page,
                Step::Fetch(marker) => {
                    fetch(PageRequest {
                        limit,
                        marker: Some(marker),
                    })
                    .await?
                }
                Step::Done => return Ok(None),
            };

            let Page { items, next } = page;
            debug!("Fetched page of {} items (more: {})", items.len(), next.is_some());

            let step = match next {
                Some(marker) => Step::Fetch(marker),
                None => Step::Done,
            };
            Ok(Some((items, (step, fetch))))
        },
    )
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, E>)))
    .try_flatten()
}

/// Collects all items starting from an already fetched first page.
/// The first failing fetch aborts the whole listing.
pub async fn collect_pages<T, E, F, Fut>(
    first: Page<T>,
    limit: u32,
    fetch_next: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    page_stream(first, limit, fetch_next).try_collect().await
}

/// Fetches the first page with `limit` and drains the rest of the listing.
pub async fn paginate<T, E, F, Fut>(limit: u32, mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let first = fetch(PageRequest::first(limit)).await?;
    collect_pages(first, limit, fetch).await
}
