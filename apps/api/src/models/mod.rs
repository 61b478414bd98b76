pub mod application;
pub mod chat;
pub mod job;
pub mod notification;
pub mod portfolio;
pub mod review;
pub mod skill;
pub mod user;

use serde::Deserialize;

/// `?page=&limit=` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    /// Returns `(limit, offset)` with `page` starting at 1 and `limit`
    /// clamped to `1..=max_limit`.
    pub fn limit_offset(&self, default_limit: u32, max_limit: u32) -> (i64, i64) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        let page = self.page.unwrap_or(1).max(1);
        (limit as i64, ((page - 1) as i64) * limit as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_first_page() {
        let p = Pagination::default();
        assert_eq!(p.limit_offset(20, 100), (20, 0));
    }

    #[test]
    fn test_limit_is_clamped() {
        let p = Pagination {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(p.limit_offset(20, 100), (100, 200));
    }

    #[test]
    fn test_page_zero_is_treated_as_first() {
        let p = Pagination {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(p.limit_offset(20, 100), (1, 0));
    }
}
