//! Pagination over DataMall listing endpoints.
//!
//! Pages are 1-based. A page with no records marks the end of the listing.

use std::future::Future;

use tracing::{debug, warn};

use super::error::TransitError;

/// `$skip` value for a 1-based page number.
pub(crate) fn skip_for_page(page: u32, page_size: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Fetch pages in order until an item satisfies `matches`.
///
/// Returns `Ok(None)` when the listing runs out or `max_pages` pages have
/// been searched without a match.
pub(crate) async fn find_in_pages<T, F, Fut, P>(
    max_pages: u32,
    mut fetch_page: F,
    mut matches: P,
) -> Result<Option<T>, TransitError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, TransitError>>,
    P: FnMut(&T) -> bool,
{
    for page in 1..=max_pages {
        let items = fetch_page(page).await?;
        if items.is_empty() {
            debug!(page, "Listing exhausted without a match");
            return Ok(None);
        }

        if let Some(found) = items.into_iter().find(|item| matches(item)) {
            return Ok(Some(found));
        }
    }

    warn!(max_pages, "Page limit reached without a match");
    Ok(None)
}

/// Fetch every page in order, handing each non-empty page to `each`.
///
/// Returns the number of non-empty pages seen.
pub(crate) async fn for_each_page<T, F, Fut, G>(
    max_pages: u32,
    mut fetch_page: F,
    mut each: G,
) -> Result<u32, TransitError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, TransitError>>,
    G: FnMut(Vec<T>),
{
    for page in 1..=max_pages {
        let items = fetch_page(page).await?;
        if items.is_empty() {
            return Ok(page - 1);
        }
        each(items);
    }

    warn!(max_pages, "Page limit reached before the listing was exhausted");
    Ok(max_pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn pages() -> Vec<Vec<u32>> {
        vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]
    }

    /// Serves `pages` then empty pages forever, counting requests.
    fn fetcher<'a>(
        pages: &'a [Vec<u32>],
        calls: &'a Cell<u32>,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<Vec<u32>, TransitError>> + 'a {
        move |page| {
            calls.set(calls.get() + 1);
            let items = pages.get(page as usize - 1).cloned().unwrap_or_default();
            std::future::ready(Ok(items))
        }
    }

    #[test]
    fn skip_values() {
        assert_eq!(skip_for_page(1, 500), 0);
        assert_eq!(skip_for_page(2, 500), 500);
        assert_eq!(skip_for_page(5, 500), 2000);
    }

    #[tokio::test]
    async fn finds_match_on_later_page() {
        let pages = pages();
        let calls = Cell::new(0);
        let found = find_in_pages(100, fetcher(&pages, &calls), |&n| n == 5)
            .await
            .unwrap();
        assert_eq!(found, Some(5));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn empty_page_ends_search() {
        let pages = pages();
        let calls = Cell::new(0);
        let found = find_in_pages(100, fetcher(&pages, &calls), |&n| n == 42)
            .await
            .unwrap();
        assert_eq!(found, None);
        // three full pages then one empty page
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn page_ceiling_ends_search() {
        let calls = Cell::new(0);
        let found = find_in_pages(
            10,
            |_page| {
                calls.set(calls.get() + 1);
                std::future::ready(Ok::<_, TransitError>(vec![0u32]))
            },
            |&n| n == 1,
        )
        .await
        .unwrap();
        assert_eq!(found, None);
        assert_eq!(calls.get(), 10);
    }

    #[tokio::test]
    async fn errors_propagate() {
        let result = find_in_pages(
            10,
            |_page| std::future::ready(Err::<Vec<u32>, _>(TransitError::Authentication)),
            |_| true,
        )
        .await;
        assert!(matches!(result, Err(TransitError::Authentication)));
    }

    #[tokio::test]
    async fn for_each_page_visits_all_pages() {
        let pages = pages();
        let calls = Cell::new(0);
        let mut seen = Vec::new();
        let count = for_each_page(1000, fetcher(&pages, &calls), |items| seen.extend(items))
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
