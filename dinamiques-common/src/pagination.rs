//! Pagination utilities
//!
//! Pages are 1-indexed. The catalog grid shows a growing window
//! (`visible_window`) while the HTTP listing serves discrete pages
//! (`page_slice`); both share `calculate_pagination`.

/// Default number of dynamics per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Index of the first record on the page
    pub offset: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]. A zero page size is
/// treated as one.
///
/// # Examples
/// ```
/// use dinamiques_common::pagination::calculate_pagination;
///
/// // 120 results at 50 per page = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2, 50);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(120, 99, 50);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 100);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

/// Records on one page
pub fn page_slice<T>(records: &[T], requested_page: usize, page_size: usize) -> &[T] {
    let p = calculate_pagination(records.len(), requested_page, page_size);
    let end = (p.offset + p.page_size).min(records.len());
    &records[p.offset.min(end)..end]
}

/// Records visible after `pages_loaded` pages of "load more"
pub fn visible_window<T>(records: &[T], pages_loaded: usize, page_size: usize) -> &[T] {
    let end = pages_loaded
        .max(1)
        .saturating_mul(page_size.max(1))
        .min(records.len());
    &records[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(250, 2, 100);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(150, 99, 100);
        assert_eq!(p.page, 2); // Clamped to last page
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(150, 0, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, 50);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(100, 2, 50);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_page_slice() {
        let data: Vec<u32> = (0..7).collect();
        assert_eq!(page_slice(&data, 1, 3), &[0, 1, 2]);
        assert_eq!(page_slice(&data, 3, 3), &[6]);
        assert_eq!(page_slice(&data, 9, 3), &[6]);
        assert!(page_slice::<u32>(&[], 1, 3).is_empty());
    }

    #[test]
    fn test_visible_window_grows_monotonically() {
        let data: Vec<u32> = (0..7).collect();
        let mut previous = 0;
        for pages in 1..5 {
            let len = visible_window(&data, pages, 3).len();
            assert!(len >= previous);
            previous = len;
        }
        assert_eq!(visible_window(&data, 1, 3).len(), 3);
        assert_eq!(visible_window(&data, 4, 3).len(), 7);
    }
}
