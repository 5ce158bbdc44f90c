//! Result pagination

use serde::Serialize;

/// One page of a result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    /// 1-based
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T> PaginatedResult<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice `results` into a page. Page 0 is treated as page 1 and a zero
/// limit as 1; a page past the end is empty but keeps the totals.
pub fn paginate<T: Clone>(results: &[T], page: usize, limit: usize) -> PaginatedResult<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_count = results.len();
    let total_pages = total_count.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    let items = results
        .get(start..)
        .map(|rest| rest.iter().take(limit).cloned().collect())
        .unwrap_or_default();

    PaginatedResult {
        items,
        total_count,
        page,
        limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_second_page() {
        let results: Vec<u32> = (0..25).collect();
        let page = paginate(&results, 2, 10);
        assert_eq!(page.items, results[10..20].to_vec());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_count, 25);
        assert!(page.has_next());
    }

    #[test]
    fn test_last_partial_page() {
        let results: Vec<u32> = (0..25).collect();
        let page = paginate(&results, 3, 10);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert!(!page.has_next());
    }

    #[test]
    fn test_out_of_range_page() {
        let results: Vec<u32> = (0..5).collect();
        let page = paginate(&results, 9, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_degenerate_arguments() {
        let results = vec!["a", "b"];
        let page = paginate(&results, 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.items, vec!["a"]);

        let empty: Vec<u8> = Vec::new();
        let page = paginate(&empty, 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }

    proptest! {
        #[test]
        fn prop_pages_cover_results(len in 0usize..200, limit in 1usize..30) {
            let results: Vec<usize> = (0..len).collect();
            let first = paginate(&results, 1, limit);
            let mut collected = Vec::new();
            for page in 1..=first.total_pages {
                let p = paginate(&results, page, limit);
                prop_assert!(p.items.len() <= limit);
                collected.extend(p.items);
            }
            prop_assert_eq!(collected, results);
            prop_assert_eq!(first.total_pages, (len + limit - 1) / limit);
        }
    }
}
