//! Call listing service
//!
//! Reads stored calls newest first, assigns each distinct call id a cyclic
//! band so a renderer can shade the legs of one call alike, and reports the
//! neighbouring page numbers.

use crate::constants::{FIRST_GROUP, FIRST_PAGE, MIN_LIMIT};
use pbxlog_core::{
    config::{ListingConfig, PageOffsetMode},
    models::{CallPage, CallRow, StoredCall},
    traits::{CallQuery, PageWindow},
    AppResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Listing parameters as received. Missing values fall back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub page: Option<i64>,
}

/// Request after defaults, bounds and the page override are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedRequest {
    page: i64,
    window: PageWindow,
}

impl ListingRequest {
    fn resolve(&self, settings: &ListingConfig) -> ResolvedRequest {
        let limit = self
            .limit
            .filter(|l| *l >= MIN_LIMIT)
            .unwrap_or(settings.default_limit.max(MIN_LIMIT));
        let page = self.page.filter(|p| *p >= FIRST_PAGE).unwrap_or(FIRST_PAGE);
        let mut offset = self.offset.filter(|o| *o >= 0).unwrap_or(0);

        if page > FIRST_PAGE {
            offset = match settings.page_offset {
                PageOffsetMode::Legacy => page.saturating_mul(limit),
                PageOffsetMode::Standard => (page - 1).saturating_mul(limit),
            };
        }

        ResolvedRequest {
            page,
            window: PageWindow::new(limit, offset),
        }
    }
}

/// Assigns bands 1..=cycle to call ids in order of first appearance.
///
/// Lives for one listing only; bands are never shared across requests.
#[derive(Debug)]
pub struct GroupBander {
    cycle: u32,
    next: u32,
    assigned: HashMap<i64, u32>,
}

impl GroupBander {
    /// A cycle of zero is treated as one
    pub fn new(cycle: u32) -> Self {
        Self {
            cycle: cycle.max(1),
            next: FIRST_GROUP,
            assigned: HashMap::new(),
        }
    }

    /// Band for `call_id`, assigning the next one on first sight
    pub fn group_for(&mut self, call_id: i64) -> u32 {
        if let Some(group) = self.assigned.get(&call_id) {
            return *group;
        }

        let group = self.next;
        self.next = if group >= self.cycle { FIRST_GROUP } else { group + 1 };
        self.assigned.insert(call_id, group);
        group
    }

    pub fn band(&mut self, calls: Vec<StoredCall>) -> Vec<CallRow> {
        calls
            .into_iter()
            .map(|call| CallRow {
                group: self.group_for(call.call_id),
                call,
            })
            .collect()
    }
}

/// Paginated, banded view over the call store
pub struct CallListingService {
    query: Arc<dyn CallQuery>,
    settings: ListingConfig,
}

impl CallListingService {
    pub fn new(query: Arc<dyn CallQuery>, settings: ListingConfig) -> Self {
        Self { query, settings }
    }

    pub fn settings(&self) -> &ListingConfig {
        &self.settings
    }

    /// Produce one page of the listing.
    ///
    /// # Errors
    ///
    /// Propagates query failures from the store.
    #[instrument(skip(self))]
    pub async fn list(&self, request: ListingRequest) -> AppResult<CallPage> {
        let ResolvedRequest { page, window } = request.resolve(&self.settings);

        let calls = self.query.fetch_calls(window).await?;
        debug!(
            rows = calls.len(),
            limit = window.limit,
            offset = window.offset,
            "Fetched call rows"
        );

        let rows = GroupBander::new(self.settings.group_cycle).band(calls);

        Ok(CallPage {
            rows,
            page,
            prev: (page - 1).max(FIRST_PAGE),
            next: page.saturating_add(1),
            limit: window.limit,
            offset: window.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pbxlog_core::AppError;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn settings(mode: PageOffsetMode) -> ListingConfig {
        ListingConfig {
            default_limit: 200,
            group_cycle: 2,
            page_offset: mode,
        }
    }

    fn request(limit: Option<i64>, offset: Option<i64>, page: Option<i64>) -> ListingRequest {
        ListingRequest {
            limit,
            offset,
            page,
        }
    }

    fn call(call_id: i64) -> StoredCall {
        StoredCall {
            call_id,
            ..Default::default()
        }
    }

    /// Returns canned rows and remembers the window it was asked for
    struct CannedQuery {
        calls: Vec<StoredCall>,
        windows: Mutex<Vec<PageWindow>>,
    }

    impl CannedQuery {
        fn new(ids: &[i64]) -> Arc<Self> {
            Arc::new(Self {
                calls: ids.iter().copied().map(call).collect(),
                windows: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CallQuery for CannedQuery {
        async fn fetch_calls(&self, window: PageWindow) -> Result<Vec<StoredCall>, AppError> {
            self.windows.lock().unwrap().push(window);
            Ok(self.calls.clone())
        }
    }

    struct BrokenQuery;

    #[async_trait]
    impl CallQuery for BrokenQuery {
        async fn fetch_calls(&self, _window: PageWindow) -> Result<Vec<StoredCall>, AppError> {
            Err(AppError::Database("relation \"calls\" does not exist".into()))
        }
    }

    #[test]
    fn test_defaults() {
        let resolved = ListingRequest::default().resolve(&settings(PageOffsetMode::Legacy));
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.window, PageWindow::new(200, 0));
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let resolved =
            request(Some(0), Some(-3), Some(0)).resolve(&settings(PageOffsetMode::Legacy));
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.window, PageWindow::new(200, 0));
    }

    #[test]
    fn test_first_page_keeps_offset() {
        let resolved =
            request(Some(50), Some(10), Some(1)).resolve(&settings(PageOffsetMode::Legacy));
        assert_eq!(resolved.window, PageWindow::new(50, 10));
    }

    #[test]
    fn test_legacy_page_override() {
        let resolved =
            request(Some(50), Some(10), Some(2)).resolve(&settings(PageOffsetMode::Legacy));
        assert_eq!(resolved.window, PageWindow::new(50, 100));
    }

    #[test]
    fn test_standard_page_offset() {
        let resolved =
            request(Some(50), Some(10), Some(2)).resolve(&settings(PageOffsetMode::Standard));
        assert_eq!(resolved.window, PageWindow::new(50, 50));
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let resolved =
            request(Some(i64::MAX), None, Some(i64::MAX)).resolve(&settings(PageOffsetMode::Legacy));
        assert_eq!(resolved.window.offset, i64::MAX);
    }

    #[test]
    fn test_bander_cycles_and_reuses() {
        let mut bander = GroupBander::new(2);
        assert_eq!(bander.group_for(10), 1);
        assert_eq!(bander.group_for(10), 1);
        assert_eq!(bander.group_for(11), 2);
        assert_eq!(bander.group_for(12), 1);
        assert_eq!(bander.group_for(11), 2);
    }

    #[test]
    fn test_bander_five_band_cycle() {
        let mut bander = GroupBander::new(5);
        let groups: Vec<u32> = (0..7).map(|id| bander.group_for(id)).collect();
        assert_eq!(groups, vec![1, 2, 3, 4, 5, 1, 2]);
    }

    #[test]
    fn test_bander_zero_cycle() {
        let mut bander = GroupBander::new(0);
        assert_eq!(bander.group_for(1), 1);
        assert_eq!(bander.group_for(2), 1);
    }

    #[tokio::test]
    async fn test_list_groups_call_legs() {
        let query = CannedQuery::new(&[7, 7, 6, 5, 5, 4]);
        let service = CallListingService::new(query.clone(), settings(PageOffsetMode::Legacy));

        let page = service.list(request(Some(50), None, Some(1))).await.unwrap();

        let groups: Vec<u32> = page.rows.iter().map(|r| r.group).collect();
        assert_eq!(groups, vec![1, 1, 2, 1, 1, 2]);
        assert_eq!(page.distinct_calls(), 4);
        assert_eq!((page.page, page.prev, page.next), (1, 1, 2));
        assert_eq!(*query.windows.lock().unwrap(), vec![PageWindow::new(50, 0)]);
    }

    #[tokio::test]
    async fn test_list_reports_neighbour_pages() {
        let query = CannedQuery::new(&[]);
        let service = CallListingService::new(query.clone(), settings(PageOffsetMode::Legacy));

        let page = service.list(request(Some(50), None, Some(3))).await.unwrap();
        assert!(page.is_empty());
        assert_eq!((page.prev, page.next), (2, 4));
        assert_eq!((page.limit, page.offset), (50, 150));
    }

    #[tokio::test]
    async fn test_bands_restart_per_request() {
        let query = CannedQuery::new(&[1, 2, 3]);
        let service = CallListingService::new(query, settings(PageOffsetMode::Legacy));

        let first = service.list(ListingRequest::default()).await.unwrap();
        let second = service.list(ListingRequest::default()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.rows[0].group, 1);
    }

    #[tokio::test]
    async fn test_list_propagates_query_errors() {
        let service = CallListingService::new(Arc::new(BrokenQuery), settings(PageOffsetMode::Legacy));
        let err = service.list(ListingRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    proptest! {
        #[test]
        fn prop_same_call_same_group(
            ids in proptest::collection::vec(0i64..20, 0..200),
            cycle in 1u32..8,
        ) {
            let rows = GroupBander::new(cycle).band(ids.into_iter().map(call).collect());

            let mut seen: HashMap<i64, u32> = HashMap::new();
            for row in &rows {
                prop_assert!(row.group >= 1 && row.group <= cycle);
                let group = *seen.entry(row.call.call_id).or_insert(row.group);
                prop_assert_eq!(group, row.group);
            }
        }

        #[test]
        fn prop_kth_distinct_call_follows_cycle(
            ids in proptest::collection::vec(any::<i64>(), 0..100),
            cycle in 1u32..8,
        ) {
            let rows = GroupBander::new(cycle).band(ids.into_iter().map(call).collect());

            let mut distinct = 0u32;
            let mut seen = std::collections::HashSet::new();
            for row in &rows {
                if seen.insert(row.call.call_id) {
                    prop_assert_eq!(row.group, distinct % cycle + 1);
                    distinct += 1;
                }
            }
        }
    }
}
