//! Result type alias for Storefeed

use super::errors::StorefeedError;

/// Result type alias for Storefeed operations
///
/// # Examples
///
/// ```
/// use storefeed::domain::result::Result;
/// use storefeed::domain::errors::StorefeedError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(StorefeedError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, StorefeedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StorefeedError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(StorefeedError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
