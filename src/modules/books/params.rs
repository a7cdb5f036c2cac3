use url::form_urlencoded;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Query string of `GET /books`, exactly as sent.
///
/// Every field is kept as text so that bad numbers fall back to defaults.
/// Parsing never fails: unknown keys are ignored and a repeated key keeps
/// its first value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListBooksParams {
    pub author_id: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListBooksParams {
    /// Decode a raw `application/x-www-form-urlencoded` query string.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(raw) = raw else {
            return params;
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let slot = match &*key {
                "author_id" => &mut params.author_id,
                "sort" => &mut params.sort,
                "page" => &mut params.page,
                "page_size" => &mut params.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        params
    }
}

/// Publish-date ordering of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only the exact value `asc` sorts ascending; anything else is descending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortOrder::Asc
    }
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBooksQuery {
    pub author_id: Option<String>,
    pub sort: SortOrder,
    pub page: u64,
    pub page_size: u64,
}

impl Default for ListBooksQuery {
    fn default() -> Self {
        Self {
            author_id: None,
            sort: SortOrder::default(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListBooksQuery {
    /// Zero-based inclusive row range `[(page-1)*page_size, page*page_size-1]`.
    pub fn row_range(&self) -> (u64, u64) {
        let start = (self.page - 1).saturating_mul(self.page_size);
        let end = self.page.saturating_mul(self.page_size).saturating_sub(1);
        (start, end)
    }
}

impl From<ListBooksParams> for ListBooksQuery {
    fn from(params: ListBooksParams) -> Self {
        Self {
            author_id: params.author_id.filter(|id| !id.is_empty()),
            sort: SortOrder::parse(params.sort.as_deref()),
            page: positive_or(params.page.as_deref(), DEFAULT_PAGE),
            page_size: positive_or(params.page_size.as_deref(), DEFAULT_PAGE_SIZE),
        }
    }
}

/// Absent, non-numeric and zero values silently become `default`.
fn positive_or(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> ListBooksParams {
        ListBooksParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn omitted_parameters_use_defaults() {
        let query = ListBooksQuery::from(ListBooksParams::default());
        assert_eq!(query, ListBooksQuery::default());
        assert_eq!(query.sort, SortOrder::Desc);
        assert_eq!(query.row_range(), (0, 9));
    }

    #[test]
    fn row_range_follows_page_and_size() {
        let query = ListBooksQuery::from(params(Some("2"), Some("10")));
        assert_eq!(query.row_range(), (10, 19));

        let query = ListBooksQuery::from(params(Some("3"), Some("25")));
        assert_eq!(query.row_range(), (50, 74));
    }

    #[test]
    fn unusable_numbers_fall_back_silently() {
        for bad in ["abc", "", "-2", "0", "1.5", "99999999999999999999999"] {
            let query = ListBooksQuery::from(params(Some(bad), Some(bad)));
            assert_eq!(query.page, DEFAULT_PAGE, "page {bad:?}");
            assert_eq!(query.page_size, DEFAULT_PAGE_SIZE, "page_size {bad:?}");
        }
    }

    #[test]
    fn huge_pages_saturate_instead_of_overflowing() {
        let query = ListBooksQuery {
            page: u64::MAX,
            page_size: u64::MAX,
            ..Default::default()
        };
        let (start, end) = query.row_range();
        assert_eq!(start, u64::MAX);
        assert_eq!(end, u64::MAX - 1);
    }

    #[test]
    fn only_exact_asc_sorts_ascending() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        for other in [None, Some("desc"), Some("ASC"), Some(""), Some("random")] {
            assert_eq!(SortOrder::parse(other), SortOrder::Desc, "{other:?}");
        }
    }

    #[test]
    fn query_string_keeps_first_value_of_repeated_keys() {
        let params = ListBooksParams::from_query(Some("page=2&page=3&sort=asc&sort=desc&x=1"));
        assert_eq!(params.page.as_deref(), Some("2"));
        assert_eq!(params.sort.as_deref(), Some("asc"));
        assert_eq!(params.page_size, None);
    }

    #[test]
    fn query_string_is_percent_decoded() {
        let params = ListBooksParams::from_query(Some("author_id=a%20b%26c&page_size=+5"));
        assert_eq!(params.author_id.as_deref(), Some("a b&c"));
        assert_eq!(ListBooksQuery::from(params).page_size, 5);
    }

    #[test]
    fn absent_or_garbled_query_string_yields_defaults() {
        assert_eq!(ListBooksParams::from_query(None), ListBooksParams::default());
        let query = ListBooksQuery::from(ListBooksParams::from_query(Some("&&=%zz&page")));
        assert_eq!(query, ListBooksQuery::default());
    }

    #[test]
    fn empty_author_id_means_no_filter() {
        let query = ListBooksQuery::from(ListBooksParams {
            author_id: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(query.author_id, None);
    }
}
