use super::ValidationError;

/// Normalizes an optional team description.
///
/// Blank descriptions collapse to `None`.
pub fn validate_description(
    description: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    if trimmed.chars().count() > max {
        return Err(ValidationError::DescriptionTooLong { max });
    }

    Ok(Some(trimmed.to_owned()))
}
