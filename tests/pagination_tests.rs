use blog_gate::{
    AppError,
    pagination::{Page, PageRequest, page},
};
use std::sync::{Arc, Mutex};

// --- Helpers ---

/// Simulates an ordered range query over `total` rows.
fn rows(total: i64) -> Vec<i64> {
    (0..total).collect()
}

// --- Tests ---

#[test]
fn test_more_rows_than_page_size_sets_has_more() {
    for page_size in [1, 3, 10] {
        // What the store returns for `page_size + 1` requested rows.
        let fetched = rows(page_size + 1);
        let page = Page::from_rows(fetched, page_size);

        assert_eq!(page.items.len() as i64, page_size);
        assert!(page.has_more);
    }
}

#[test]
fn test_exactly_page_size_rows_has_no_more() {
    let page = Page::from_rows(rows(5), 5);
    assert_eq!(page.items, vec![0, 1, 2, 3, 4]);
    assert!(!page.has_more);
}

#[test]
fn test_fewer_rows_than_page_size() {
    let page = Page::from_rows(rows(2), 5);
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_more);

    let empty: Page<i64> = Page::from_rows(vec![], 5);
    assert!(empty.items.is_empty());
    assert!(!empty.has_more);
}

#[test]
fn test_trim_keeps_leading_rows_in_order() {
    let page = Page::from_rows(vec!["c", "b", "a", "z"], 3);
    assert_eq!(page.items, vec!["c", "b", "a"]);
}

#[test]
fn test_page_request_validation() {
    assert!(PageRequest::new(0, 10, 100).is_ok());
    assert!(PageRequest::new(25, 100, 100).is_ok());

    for (offset, size) in [(-1, 10), (0, 0), (0, -5), (0, 101)] {
        let err = PageRequest::new(offset, size, 100).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailure(_)), "({offset}, {size})");
    }
}

#[test]
fn test_fetch_limit_is_one_more_than_page_size() {
    let request = PageRequest::new(0, 10, 100).unwrap();
    assert_eq!(request.fetch_limit(), 11);
}

#[tokio::test]
async fn test_page_issues_single_query_for_page_size_plus_one() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let all = rows(25);

    let request = PageRequest::new(20, 4, 100).unwrap();
    let result = page(request, |offset, limit| {
        recorded.lock().unwrap().push((offset, limit));
        let window: Vec<i64> = all
            .iter()
            .copied()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        async move { Ok(window) }
    })
    .await
    .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![(20, 5)]);
    assert_eq!(result.items, vec![20, 21, 22, 23]);
    assert!(result.has_more);
}

#[tokio::test]
async fn test_page_last_page_reports_no_more() {
    let all = rows(25);
    let request = PageRequest::new(20, 5, 100).unwrap();

    let result = page(request, |offset, limit| {
        let window: Vec<i64> = all
            .iter()
            .copied()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        async move { Ok(window) }
    })
    .await
    .unwrap();

    assert_eq!(result.items, vec![20, 21, 22, 23, 24]);
    assert!(!result.has_more);
}

#[tokio::test]
async fn test_page_propagates_store_error() {
    let request = PageRequest::new(0, 5, 100).unwrap();

    let result: Result<Page<i64>, AppError> = page(request, |_, _| async {
        Err(AppError::StoreUnavailable("down".to_string()))
    })
    .await;

    assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
}
