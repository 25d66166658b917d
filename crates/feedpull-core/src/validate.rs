//! Request validation: required identifiers are checked before any network
//! call and never retried.

use crate::error::ValidationError;

/// Fails with `ValidationError` when `value` is empty or whitespace-only.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(field));
    }
    Ok(())
}

/// Fails when the value set is empty or contains only blank entries.
pub fn require_values(field: &'static str, values: &[String]) -> Result<(), ValidationError> {
    if values.iter().all(|v| v.trim().is_empty()) {
        return Err(ValidationError(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_accepts_non_empty() {
        assert!(require("feedType", "CURATED_ITEM_FEED").is_ok());
    }

    #[test]
    fn require_rejects_empty_and_blank() {
        assert!(require("feedType", "").is_err());
        assert!(require("categoryId", "   ").is_err());
        let err = require("marketplaceId", "").unwrap_err();
        assert_eq!(err.to_string(), "missing marketplaceId in the request");
    }

    #[test]
    fn require_values_rejects_empty_set() {
        assert!(require_values("itemIds", &[]).is_err());
        assert!(require_values("itemIds", &["".to_string(), " ".to_string()]).is_err());
        assert!(require_values("itemIds", &["v1|1".to_string()]).is_ok());
    }
}
