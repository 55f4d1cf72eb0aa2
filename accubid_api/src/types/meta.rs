use serde::{Deserialize, Serialize};

/// One page of a paginated list endpoint.
///
/// Pages are 0-based. `total_pages == 0` means an empty result set, which is
/// neither a first-with-more nor a last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages.saturating_sub(1)
    }

    pub fn is_first_page(&self) -> bool {
        self.page == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.page == self.total_pages.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: i64, total_pages: i64) -> PaginatedResponse<u8> {
        PaginatedResponse {
            page,
            page_size: 25,
            total_records: total_pages * 25,
            total_pages,
            items: Vec::new(),
        }
    }

    #[test]
    fn single_page() {
        let p = page(0, 1);
        assert!(p.is_first_page());
        assert!(p.is_last_page());
        assert!(!p.has_next_page());
    }

    #[test]
    fn middle_page() {
        let p = page(1, 3);
        assert!(!p.is_first_page());
        assert!(!p.is_last_page());
        assert!(p.has_next_page());
    }

    #[test]
    fn last_page() {
        let p = page(2, 3);
        assert!(p.is_last_page());
        assert!(!p.has_next_page());
    }

    #[test]
    fn empty_result_set() {
        let p = page(0, 0);
        assert!(p.is_first_page());
        assert!(!p.is_last_page());
        assert!(!p.has_next_page());
    }

    #[test]
    fn extreme_total_pages_do_not_overflow() {
        let mut p = PaginatedResponse::<u8> {
            page: i64::MIN,
            page_size: 0,
            total_records: 0,
            total_pages: i64::MIN,
            items: Vec::new(),
        };
        assert!(p.is_last_page());
        assert!(!p.has_next_page());

        p.page = 0;
        assert!(!p.is_last_page());
        assert!(!p.has_next_page());
    }

    #[test]
    fn has_next_page_matches_definition() {
        for total in 0..6 {
            for current in 0..6 {
                assert_eq!(page(current, total).has_next_page(), current < total - 1);
            }
        }
    }

    #[test]
    fn deserializes_camel_case_and_defaults_items() {
        let p: PaginatedResponse<u8> =
            serde_json::from_str(r#"{"page":0,"pageSize":50,"totalRecords":0,"totalPages":0}"#)
                .unwrap();
        assert_eq!(p.page_size, 50);
        assert!(p.items.is_empty());
    }
}
