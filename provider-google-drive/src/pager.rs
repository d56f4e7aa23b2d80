//! Page-at-a-time listing.

use crate::error::{GoogleDriveError, Result};
use crate::session::DriveSession;
use crate::types::{FileMetadata, ListQuery, ListRequest};
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// Walks a files.list result set one page at a time.
///
/// Each call to [`next_page`](Self::next_page) issues one request carrying
/// the previous page's token. The pager is finished once a page arrives
/// without a token.
///
/// ```ignore
/// let mut pager = client.pages(&ListQuery::default());
/// while let Some(files) = pager.next_page().await? {
///     for file in files {
///         println!("{}", file["name"]);
///     }
/// }
/// ```
pub struct FilePager {
    session: Arc<dyn DriveSession>,
    request: ListRequest,
    finished: bool,
    pages_fetched: usize,
}

impl FilePager {
    pub fn new(session: Arc<dyn DriveSession>, query: &ListQuery) -> Self {
        Self {
            session,
            request: ListRequest {
                query: query.query.clone(),
                spaces: query.spaces.clone(),
                fields: query.response_fields(),
                page_token: None,
                page_size: query.page_size,
            },
            finished: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page; `Ok(None)` once the listing is exhausted.
    ///
    /// A failed request leaves the pager where it was, so the same page can
    /// be asked for again.
    pub async fn next_page(&mut self) -> Result<Option<Vec<FileMetadata>>> {
        if self.finished {
            return Ok(None);
        }

        let page = self.session.list(&self.request).await?;
        self.pages_fetched += 1;

        debug!(
            page = self.pages_fetched,
            files = page.files.len(),
            has_next = page.next_page_token.is_some(),
            "Fetched listing page"
        );

        match page.next_page_token {
            Some(token) => self.request.page_token = Some(token),
            None => self.finished = true,
        }

        Ok(Some(page.files))
    }

    /// Start again from the first page
    pub fn restart(&mut self) {
        self.request.page_token = None;
        self.finished = false;
        self.pages_fetched = 0;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pages requested since creation or the last restart
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drain every page into one vector; any failure discards what was collected.
    pub async fn collect_all(mut self) -> Result<Vec<FileMetadata>> {
        let mut files = Vec::new();
        while let Some(page) = self.next_page().await? {
            files.extend(page);
        }
        Ok(files)
    }

    /// Flatten the remaining pages into a stream of records.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<FileMetadata>> + Send {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, GoogleDriveError>(pager.next_page().await?.map(|files| (files, pager)))
        })
        .map_ok(|files| stream::iter(files.into_iter().map(Ok::<_, GoogleDriveError>)))
        .try_flatten()
    }
}
