//! Pagination contract for the measurement log.
//!
//! Out-of-range inputs are clamped, never rejected: callers asking for page 0
//! get page 1, and a page size above [`MAX_PAGE_SIZE`] is capped. Sort keys
//! are parsed against a fixed whitelist and silently fall back to
//! [`SortKey::MeasuredAt`], so an arbitrary client string can never reach the
//! SQL `ORDER BY` clause.

/// Largest page a single request may fetch.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Whitelisted sort keys for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    MeasuredAt,
    CreatedAt,
    UpdatedAt,
    Spo2,
    Fev1,
    Fvc,
    Pef,
    Id,
}

impl SortKey {
    /// Parse a client-supplied sort key. Unknown values fall back to
    /// `MeasuredAt` rather than erroring.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            "spo2" => Self::Spo2,
            "fev1" => Self::Fev1,
            "fvc" => Self::Fvc,
            "pef" => Self::Pef,
            "id" => Self::Id,
            _ => Self::MeasuredAt,
        }
    }

    /// The SQL column this key sorts on. Only these fixed strings ever reach
    /// an `ORDER BY` clause.
    pub const fn column(self) -> &'static str {
        match self {
            Self::MeasuredAt => "measured_at",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Spo2 => "spo2",
            Self::Fev1 => "fev1",
            Self::Fvc => "fvc",
            Self::Pef => "pef",
            Self::Id => "id",
        }
    }
}

/// Sort direction for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a client-supplied order. Anything other than "asc"
    /// (case-insensitive) means descending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Normalize raw client values: page floors at 1; a page size of 0 means
    /// "not provided" and becomes [`DEFAULT_PAGE_SIZE`], anything else is
    /// clamped into `[1, MAX_PAGE_SIZE]`.
    pub fn clamped(page: u32, page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };
        Self {
            page: page.max(1),
            page_size,
        }
    }

    /// Row offset of the first item on this page.
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// One page of results plus the bookkeeping the API returns alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from a normalized request, the unfiltered total row
    /// count, and the fetched items.
    ///
    /// An empty result set still reports one total page, so `page=1` of an
    /// empty listing has `has_next == false` rather than pointing past the
    /// end.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(req: PageRequest, total_count: u64, items: Vec<T>) -> Self {
        let total_pages = total_count
            .div_ceil(u64::from(req.page_size))
            .max(1)
            .min(u64::from(u32::MAX)) as u32;
        Self {
            page: req.page,
            page_size: req.page_size,
            total_pages,
            total_count,
            has_next: req.page < total_pages,
            has_prev: req.page > 1,
            items,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_clamps_to_one() {
        let req = PageRequest::clamped(0, 10);
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn oversized_page_size_caps_at_max() {
        let req = PageRequest::clamped(1, 500);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn missing_page_size_uses_default() {
        let req = PageRequest::clamped(1, 0);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn offset_advances_by_page_size() {
        let req = PageRequest::clamped(3, 25);
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn sort_key_whitelist_parses_known_keys() {
        assert_eq!(SortKey::parse("spo2"), SortKey::Spo2);
        assert_eq!(SortKey::parse("createdAt"), SortKey::CreatedAt);
        assert_eq!(SortKey::parse("id"), SortKey::Id);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_measured_at() {
        assert_eq!(SortKey::parse("DROP TABLE records"), SortKey::MeasuredAt);
        assert_eq!(SortKey::parse(""), SortKey::MeasuredAt);
        // SQL column names are not accepted, only the API spellings
        assert_eq!(SortKey::parse("created_at"), SortKey::MeasuredAt);
    }

    #[test]
    fn order_parses_case_insensitively() {
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }

    #[test]
    fn page_math_rounds_up() {
        let req = PageRequest::clamped(1, 2);
        let page = Page::new(req, 3, vec![1, 2]);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn empty_listing_still_has_one_page() {
        let req = PageRequest::clamped(1, 10);
        let page: Page<i32> = Page::new(req, 0, Vec::new());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn last_page_has_prev_but_not_next() {
        let req = PageRequest::clamped(2, 2);
        let page = Page::new(req, 3, vec![3]);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }
}
