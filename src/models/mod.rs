//! Response and request models for the explorer API

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub mod chain;
pub mod hotspot;
pub mod stats;
pub mod validator;
pub mod wallet;

pub use chain::*;
pub use hotspot::*;
pub use stats::*;
pub use validator::*;
pub use wallet::*;

/// Default page size for listings
pub const PAGE_SIZE: i64 = 25;

/// Envelope for error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Parse a numeric path or query parameter, rejecting anything else as a
/// client error.
pub fn parse_param<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{name} must be a non-negative integer")))
}

/// `?page=N`, zero-based
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Result<i64, ApiError> {
        match self.page.as_deref() {
            None | Some("") => Ok(0),
            Some(raw) => parse_param::<u32>("page", raw).map(i64::from),
        }
    }
}

/// `?page=N&limit=M` for reward-list pagination
#[derive(Debug, Default, Deserialize)]
pub struct RewardPageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl RewardPageQuery {
    pub const DEFAULT_LIMIT: usize = 25;
    pub const MAX_LIMIT: usize = 500;

    pub fn page(&self) -> Result<usize, ApiError> {
        match self.page.as_deref() {
            None | Some("") => Ok(0),
            Some(raw) => parse_param("page", raw),
        }
    }

    /// Zero falls back to the default; anything above the cap is clamped.
    pub fn limit(&self) -> Result<usize, ApiError> {
        let limit = match self.limit.as_deref() {
            None | Some("") => 0,
            Some(raw) => parse_param::<usize>("limit", raw)?,
        };

        Ok(match limit {
            0 => Self::DEFAULT_LIMIT,
            limit => limit.min(Self::MAX_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_page_limit_is_clamped() {
        let query = RewardPageQuery {
            page: Some("2".into()),
            limit: Some("10000".into()),
        };
        assert_eq!(query.limit().unwrap(), 500);
        assert_eq!(query.page().unwrap(), 2);

        let defaults = RewardPageQuery::default();
        assert_eq!(defaults.limit().unwrap(), 25);
        assert_eq!(defaults.page().unwrap(), 0);
    }

    #[test]
    fn non_numeric_pages_are_rejected() {
        let query = PageQuery {
            page: Some("two".into()),
        };
        assert!(matches!(query.page(), Err(ApiError::BadRequest(_))));

        let negative = PageQuery {
            page: Some("-1".into()),
        };
        assert!(negative.page().is_err());

        assert_eq!(PageQuery::default().page().unwrap(), 0);
    }
}
