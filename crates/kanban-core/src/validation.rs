use crate::error::ValidationError;

/// Field-level checks shared by the aggregates' commands.
pub struct Validator;

impl Validator {
    /// A required text field must contain at least one character.
    pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty(field));
        }
        Ok(())
    }

    /// Column names must be non-empty and distinct within their board.
    pub fn validate_column_name<'a>(
        name: &str,
        existing: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ValidationError> {
        Self::validate_non_empty("Column name", name)?;
        if existing.into_iter().any(|n| n == name) {
            return Err(ValidationError::DuplicateColumnName(name.to_string()));
        }
        Ok(())
    }
}
