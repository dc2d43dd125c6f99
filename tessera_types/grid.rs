use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::ops::Deref;

pub const DEFAULT_PAGE_INDEX: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized page window: index is 1-based and at least 1,
/// size is clamped to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPageRequest", rename_all = "camelCase")]
pub struct PageRequest {
    page_index: u32,
    page_size: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPageRequest {
    #[serde(default = "default_page_index")]
    page_index: i64,
    #[serde(default = "default_page_size")]
    page_size: i64,
}

fn default_page_index() -> i64 {
    DEFAULT_PAGE_INDEX
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page_index, raw.page_size)
    }
}

impl PageRequest {
    pub fn new(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index: page_index.clamp(1, u32::MAX as i64) as u32,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE) as u32,
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn skip(&self) -> u64 {
        (self.page_index as u64 - 1) * self.page_size as u64
    }

    pub fn take(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_INDEX, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// `"desc"` in any case is descending; anything else, including nothing, is ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, Self::Descending)
    }
}

/// A page window plus an optional sort key and direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPagedAndSortedRequest", into = "RawPagedAndSortedRequest")]
pub struct PagedAndSortedRequest {
    page: PageRequest,
    sort_by: Option<String>,
    sort_direction: SortDirection,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPagedAndSortedRequest {
    #[serde(default = "default_page_index")]
    page_index: i64,
    #[serde(default = "default_page_size")]
    page_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_by: Option<String>,
    #[serde(default)]
    sort_direction: Option<String>,
}

impl From<RawPagedAndSortedRequest> for PagedAndSortedRequest {
    fn from(raw: RawPagedAndSortedRequest) -> Self {
        Self::new(
            raw.page_index,
            raw.page_size,
            raw.sort_by.as_deref(),
            raw.sort_direction.as_deref(),
        )
    }
}

impl From<PagedAndSortedRequest> for RawPagedAndSortedRequest {
    fn from(req: PagedAndSortedRequest) -> Self {
        Self {
            page_index: req.page.page_index as i64,
            page_size: req.page.page_size as i64,
            sort_by: req.sort_by,
            sort_direction: Some(req.sort_direction.as_str().to_string()),
        }
    }
}

impl PagedAndSortedRequest {
    pub fn new(
        page_index: i64,
        page_size: i64,
        sort_by: Option<&str>,
        sort_direction: Option<&str>,
    ) -> Self {
        Self {
            page: PageRequest::new(page_index, page_size),
            sort_by: sort_by
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_direction: SortDirection::parse(sort_direction),
        }
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn page_index(&self) -> u32 {
        self.page.page_index()
    }

    pub fn page_size(&self) -> u32 {
        self.page.page_size()
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn is_descending(&self) -> bool {
        self.sort_direction.is_descending()
    }
}

impl From<PageRequest> for PagedAndSortedRequest {
    fn from(page: PageRequest) -> Self {
        Self {
            page,
            sort_by: None,
            sort_direction: SortDirection::Ascending,
        }
    }
}

fn total_pages(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size.max(1))
}

/// One page of results. `total_pages` and the navigation flags are always
/// derived from `total_count` and the page size.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResponse<T> {
    items: Vec<T>,
    page: PageRequest,
    total_count: u64,
}

impl<T> PagedResponse<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page,
            total_count,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page_index(&self) -> u32 {
        self.page.page_index()
    }

    pub fn page_size(&self) -> u32 {
        self.page.page_size()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count, self.page.page_size() as u64)
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index() > 1
    }

    pub fn has_next_page(&self) -> bool {
        (self.page_index() as u64) < self.total_pages()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResponse<U> {
        PagedResponse {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_count: self.total_count,
        }
    }
}

impl<T: Serialize> Serialize for PagedResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PagedResponse", 7)?;
        s.serialize_field("items", &self.items)?;
        s.serialize_field("pageIndex", &self.page_index())?;
        s.serialize_field("pageSize", &self.page_size())?;
        s.serialize_field("totalCount", &self.total_count)?;
        s.serialize_field("totalPages", &self.total_pages())?;
        s.serialize_field("hasPreviousPage", &self.has_previous_page())?;
        s.serialize_field("hasNextPage", &self.has_next_page())?;
        s.end()
    }
}

/// An in-memory page cut from a full list. Unlike [`PageRequest`] the size
/// is only raised to 1, never capped.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedList<T> {
    items: Vec<T>,
    page_index: u64,
    page_size: u64,
    total_count: u64,
}

impl<T> PaginatedList<T> {
    pub fn create(source: Vec<T>, page_index: i64, page_size: i64) -> Self {
        let page_index = page_index.max(1) as u64;
        let page_size = page_size.max(1) as u64;
        let total_count = source.len() as u64;
        let skip = (page_index - 1).saturating_mul(page_size);

        let items = source
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(page_size).unwrap_or(usize::MAX))
            .collect();

        Self {
            items,
            page_index,
            page_size,
            total_count,
        }
    }

    pub fn page_index(&self) -> u64 {
        self.page_index
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index < self.total_pages()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for PaginatedList<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T> IntoIterator for PaginatedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Serialize> Serialize for PaginatedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PaginatedList", 7)?;
        s.serialize_field("items", &self.items)?;
        s.serialize_field("pageIndex", &self.page_index)?;
        s.serialize_field("pageSize", &self.page_size)?;
        s.serialize_field("totalCount", &self.total_count)?;
        s.serialize_field("totalPages", &self.total_pages())?;
        s.serialize_field("hasPreviousPage", &self.has_previous_page())?;
        s.serialize_field("hasNextPage", &self.has_next_page())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 500, 1, 100)]
    #[case(-3, -3, 1, 1)]
    #[case(1, 10, 1, 10)]
    #[case(7, 100, 7, 100)]
    #[case(i64::MAX, 101, u32::MAX, 100)]
    #[case(i64::MIN, i64::MIN, 1, 1)]
    fn page_request_is_normalized(
        #[case] index: i64,
        #[case] size: i64,
        #[case] expected_index: u32,
        #[case] expected_size: u32,
    ) {
        let page = PageRequest::new(index, size);
        assert_eq!(page.page_index(), expected_index);
        assert_eq!(page.page_size(), expected_size);
    }

    #[test]
    fn skip_and_take_follow_page() {
        let page = PageRequest::new(3, 20);
        assert_eq!(page.skip(), 40);
        assert_eq!(page.take(), 20);
        assert_eq!(PageRequest::default(), PageRequest::new(1, 10));
    }

    #[rstest]
    #[case(Some("desc"), true)]
    #[case(Some("DESC"), true)]
    #[case(Some("Desc"), true)]
    #[case(Some("asc"), false)]
    #[case(Some("descending"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn only_desc_token_is_descending(#[case] direction: Option<&str>, #[case] descending: bool) {
        let req = PagedAndSortedRequest::new(1, 10, Some("name"), direction);
        assert_eq!(req.is_descending(), descending);
    }

    #[test]
    fn blank_sort_key_is_dropped() {
        assert_eq!(PagedAndSortedRequest::new(1, 10, Some("  "), None).sort_by(), None);
    }

    #[test]
    fn deserializing_normalizes() {
        let req: PagedAndSortedRequest = serde_json::from_str(
            r#"{"pageIndex":0,"pageSize":1000,"sortBy":"name","sortDirection":"DESC"}"#,
        )
        .unwrap();
        assert_eq!(req.page_index(), 1);
        assert_eq!(req.page_size(), 100);
        assert!(req.is_descending());

        let page: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(page, PageRequest::default());
    }

    #[rstest]
    #[case(25, 10, 2, 3, true, true)]
    #[case(25, 10, 3, 3, false, true)]
    #[case(0, 10, 1, 0, false, false)]
    #[case(10, 10, 1, 1, false, false)]
    fn paged_response_derives_navigation(
        #[case] total: u64,
        #[case] size: i64,
        #[case] index: i64,
        #[case] pages: u64,
        #[case] has_next: bool,
        #[case] has_previous: bool,
    ) {
        let response = PagedResponse::new(Vec::<u8>::new(), PageRequest::new(index, size), total);
        assert_eq!(response.total_pages(), pages);
        assert_eq!(response.has_next_page(), has_next);
        assert_eq!(response.has_previous_page(), has_previous);
    }

    #[test]
    fn paged_response_serializes_derived_fields() {
        let response = PagedResponse::new(vec![1, 2], PageRequest::new(2, 2), 5);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPreviousPage"], true);
        assert_eq!(json["items"], serde_json::json!([1, 2]));
    }

    #[test]
    fn paginated_list_slices_source() {
        let list = PaginatedList::create((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(&*list, &[21, 22, 23, 24, 25]);
        assert_eq!(list.total_count(), 25);
        assert_eq!(list.total_pages(), 3);
        assert!(!list.has_next_page());
        assert!(list.has_previous_page());
    }

    #[test]
    fn paginated_list_does_not_cap_size() {
        let list = PaginatedList::create((0..250).collect::<Vec<_>>(), 0, 200);
        assert_eq!(list.page_index(), 1);
        assert_eq!(list.page_size(), 200);
        assert_eq!(list.len(), 200);
        assert_eq!(list.total_pages(), 2);
    }

    #[test]
    fn paginated_list_past_the_end_is_empty() {
        let list = PaginatedList::create(vec!['a', 'b'], 9, 1);
        assert!(list.is_empty());
        assert_eq!(list.total_pages(), 2);
    }
}
