use axum::http::Uri;
use serde::Serialize;

use super::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// An absent page means the first one. A page below one, or one that does
    /// not parse, is rejected the same way as one past the end. The limit
    /// silently clamps to its bounds and falls back to the default when it
    /// does not parse.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page: i64 = match page {
            None => 1,
            Some(raw) => raw.parse().map_err(|_| AppError::InvalidPage)?,
        };
        if page < 1 {
            return Err(AppError::InvalidPage);
        }
        let limit = limit
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Ok(Self {
            page: page as usize,
            limit: limit as usize,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Swap the raw page rows for their rendered form, keeping the envelope.
    pub fn with_results<U>(self, results: Vec<U>) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
            total_pages: self.total_pages,
        }
    }
}

/// Slice one page out of the full ordered set. An empty set still has one
/// (empty) page so that `page=1` always answers.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest, uri: &Uri) -> Result<Page<T>, AppError> {
    let count = items.len();
    let total_pages = count.div_ceil(request.limit).max(1);
    if request.page > total_pages {
        return Err(AppError::InvalidPage);
    }

    let start = (request.page - 1) * request.limit;
    let results: Vec<T> = items.into_iter().skip(start).take(request.limit).collect();
    Ok(Page {
        count,
        next: (request.page < total_pages).then(|| page_url(uri, request.page + 1)),
        previous: (request.page > 1).then(|| page_url(uri, request.page - 1)),
        results,
        total_pages,
    })
}

/// The request target with the `page` query parameter replaced, other
/// parameters untouched.
fn page_url(uri: &Uri, page: usize) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();
    params.push(format!("page={page}"));
    format!("{}?{}", uri.path(), params.join("&"))
}

#[cfg(test)]
fn test_uri(target: &str) -> Uri {
    target.parse().unwrap()
}

#[test]
fn page_request_defaults_and_bounds() {
    let request = PageRequest::from_params(None, None).unwrap();
    assert_eq!(request.page, 1);
    assert_eq!(request.limit, DEFAULT_PAGE_SIZE as usize);

    let request = PageRequest::from_params(Some("3"), Some("1000")).unwrap();
    assert_eq!(request.page, 3);
    assert_eq!(request.limit, MAX_PAGE_SIZE as usize);

    let request = PageRequest::from_params(None, Some("0")).unwrap();
    assert_eq!(request.limit, 1);

    assert!(PageRequest::from_params(Some("0"), None).is_err());
    assert!(PageRequest::from_params(Some("-2"), None).is_err());
}

#[test]
fn unparseable_pages_are_rejected_but_limits_fall_back() {
    assert!(PageRequest::from_params(Some("abc"), None).is_err());
    assert!(PageRequest::from_params(Some(""), None).is_err());
    assert!(PageRequest::from_params(Some("2x"), None).is_err());

    let request = PageRequest::from_params(None, Some("abc")).unwrap();
    assert_eq!(request.page, 1);
    assert_eq!(request.limit, DEFAULT_PAGE_SIZE as usize);
}

#[test]
fn slicing_and_links() {
    let uri = test_uri("/recipes/?limit=2&page=2");
    let request = PageRequest::from_params(Some("2"), Some("2")).unwrap();
    let page = paginate(vec![1, 2, 3, 4, 5], &request, &uri).unwrap();

    assert_eq!(page.count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.results, vec![3, 4]);
    assert_eq!(page.previous.as_deref(), Some("/recipes/?limit=2&page=1"));
    assert_eq!(page.next.as_deref(), Some("/recipes/?limit=2&page=3"));
}

#[test]
fn edges_have_no_links() {
    let uri = test_uri("/recipes/");
    let request = PageRequest::from_params(None, Some("2")).unwrap();
    let page = paginate(vec![1, 2], &request, &uri).unwrap();

    assert_eq!(page.total_pages, 1);
    assert!(page.previous.is_none());
    assert!(page.next.is_none());
}

#[test]
fn empty_sets_still_have_page_one() {
    let uri = test_uri("/recipes/");
    let request = PageRequest::from_params(None, None).unwrap();
    let page = paginate(Vec::<i32>::new(), &request, &uri).unwrap();

    assert_eq!(page.count, 0);
    assert_eq!(page.total_pages, 1);
    assert!(page.results.is_empty());

    let request = PageRequest::from_params(Some("2"), None).unwrap();
    assert!(paginate(Vec::<i32>::new(), &request, &uri).is_err());
}

#[test]
fn page_past_the_end_is_rejected() {
    let uri = test_uri("/recipes/");
    let request = PageRequest::from_params(Some("4"), Some("2")).unwrap();
    assert!(paginate(vec![1, 2, 3, 4, 5], &request, &uri).is_err());
}

#[test]
fn page_url_preserves_other_parameters() {
    let uri = test_uri("/recipes/search/?query=cake&sort=rating&page=7&order=asc");
    assert_eq!(
        page_url(&uri, 2),
        "/recipes/search/?query=cake&sort=rating&order=asc&page=2"
    );

    let uri = test_uri("/recipes/");
    assert_eq!(page_url(&uri, 2), "/recipes/?page=2");
}
