use super::ValidationError;

/// Checks comment content as it will be stored, i.e. trimmed.
pub fn validate_comment_content(content: &str, max: usize) -> Result<(), ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::ContentEmpty);
    }

    if content.chars().count() > max {
        return Err(ValidationError::ContentTooLong { max });
    }

    Ok(())
}
