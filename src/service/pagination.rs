//! Offset/limit math for list requests.

use crate::config::Pagination;
use crate::error::AppError;
use std::collections::HashMap;

/// Offset and dispatched limit for one list call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    /// `requested` defaults to the resource's default limit and is capped at its max limit.
    pub fn new(offset: u32, requested: Option<u32>, pagination: &Pagination) -> Self {
        let limit = pagination.bound(requested.unwrap_or(pagination.default_limit));
        Self { offset, limit }
    }

    /// Read `offset`/`limit`, or `page`/`size` (offset = page * limit), from query parameters.
    pub fn from_query(params: &HashMap<String, String>, pagination: &Pagination) -> Result<Self, AppError> {
        let limit = parse(params, "limit")?.or(parse(params, "size")?);
        let offset = parse(params, "offset")?;
        let page = parse(params, "page")?;
        let base = Self::new(0, limit, pagination);
        let offset = match (offset, page) {
            (Some(offset), _) => offset,
            (None, Some(page)) => page.saturating_mul(base.limit),
            (None, None) => 0,
        };
        Ok(Self { offset, ..base })
    }
}

fn parse(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, AppError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("query parameter '{}' must be a non-negative integer", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: Pagination = Pagination {
        default_limit: 20,
        max_limit: 100,
    };

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn requested_limit_is_capped() {
        let page = PageRequest::from_query(&query(&[("offset", "0"), ("limit", "500")]), &CUSTOMER).unwrap();
        assert_eq!(page, PageRequest { offset: 0, limit: 100 });
    }

    #[test]
    fn dispatched_limit_is_min_of_requested_and_max() {
        for requested in [0u32, 1, 20, 99, 100, 101, 5000] {
            let page = PageRequest::new(3, Some(requested), &CUSTOMER);
            assert_eq!(page.limit, requested.min(100));
            assert_eq!(page.offset, 3);
        }
    }

    #[test]
    fn defaults_and_page_size() {
        assert_eq!(
            PageRequest::from_query(&HashMap::new(), &CUSTOMER).unwrap(),
            PageRequest { offset: 0, limit: 20 }
        );
        assert_eq!(
            PageRequest::from_query(&query(&[("page", "2"), ("size", "10")]), &CUSTOMER).unwrap(),
            PageRequest { offset: 20, limit: 10 }
        );
        let unclamped_default = Pagination { default_limit: 500, max_limit: 100 };
        assert_eq!(PageRequest::new(0, None, &unclamped_default).limit, 100);
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(PageRequest::from_query(&query(&[("limit", "-1")]), &CUSTOMER).is_err());
        assert!(PageRequest::from_query(&query(&[("offset", "abc")]), &CUSTOMER).is_err());
    }
}
