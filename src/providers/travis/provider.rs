use log::{info, warn};

use crate::config::RunSettings;
use crate::error::Result;
use crate::output::{BuildSink, DrainProgress};

use super::client::TravisClient;
use super::types::BuildsPage;

/// Travis CI build history provider.
///
/// Walks the build collection of one repository page by page, newest first,
/// handing every page to a [`BuildSink`] before requesting the next one.
pub struct TravisProvider {
    client: TravisClient,
    repository: String,
    limit: usize,
}

/// Outcome of a completed drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSummary {
    /// Pages requested, including a final empty or undecodable one
    pub pages: usize,
    /// Builds handed to the sink
    pub builds: u64,
    /// Builds the provider reported above the starting offset
    pub expected: u64,
}

/// Position of a drain within the build collection.
#[derive(Debug)]
struct Traversal {
    offset: u64,
    start_offset: u64,
    fetched: u64,
    pages: usize,
    /// Total reported by the first page
    total: Option<u64>,
}

impl Traversal {
    fn new(start_offset: u64) -> Self {
        Self {
            offset: start_offset,
            start_offset,
            fetched: 0,
            pages: 0,
            total: None,
        }
    }

    fn record(&mut self, page: &BuildsPage) {
        self.pages += 1;
        self.fetched += page.builds.len() as u64;
        self.total.get_or_insert(page.pagination.count);
    }

    fn expected(&self) -> u64 {
        self.total.unwrap_or(0).saturating_sub(self.start_offset)
    }

    /// Move to the next page. Returns `false` once the provider reports no
    /// further page.
    fn advance(&mut self, page: &BuildsPage) -> bool {
        match page.pagination.next_offset() {
            0 => false,
            next => {
                self.offset = next;
                true
            }
        }
    }
}

impl TravisProvider {
    /// Creates a provider for the repository named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be configured.
    pub fn new(settings: &RunSettings) -> Result<Self> {
        let client = TravisClient::new(
            &settings.base_url,
            settings.token.clone(),
            settings.decode_policy,
        )?;

        Ok(Self {
            client,
            repository: settings.repository.clone(),
            limit: settings.limit,
        })
    }

    /// Drain every page from `start_offset` onwards into `sink`.
    ///
    /// Pages are fetched strictly one after another; page N is written before
    /// page N+1 is requested. The drain ends when a page reports a next offset
    /// of zero, which is also what an empty page from a lenient decode failure
    /// reports.
    ///
    /// # Errors
    ///
    /// Request construction, transport, strict decode and sink failures abort
    /// the drain. Builds already handed to the sink stay there.
    pub async fn drain(
        &self,
        start_offset: u64,
        sink: &mut dyn BuildSink,
        progress: &DrainProgress,
    ) -> Result<DrainSummary> {
        info!(
            "Draining builds for repository {} from offset {start_offset} ({} per page)",
            self.repository, self.limit
        );

        let mut traversal = Traversal::new(start_offset);

        loop {
            let page = self
                .client
                .fetch_builds(&self.repository, self.limit, traversal.offset)
                .await?;

            sink.write_builds(&page.builds)?;
            traversal.record(&page);

            info!("Progress: {} of {}", traversal.fetched, traversal.expected());
            progress.update(traversal.fetched, traversal.expected());

            if !traversal.advance(&page) {
                break;
            }
        }

        let summary = DrainSummary {
            pages: traversal.pages,
            builds: traversal.fetched,
            expected: traversal.expected(),
        };

        if summary.builds != summary.expected {
            warn!(
                "Drained {} builds but the provider reported {}; output may be incomplete",
                summary.builds, summary.expected
            );
        }

        Ok(summary)
    }
}
