use super::ValidationError;

/// Checks a team name against the configured bounds and returns it trimmed.
pub fn validate_team_name(name: &str, min: usize, max: usize) -> Result<&str, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::NameEmpty);
    }

    let len = trimmed.chars().count();
    if len < min {
        return Err(ValidationError::NameTooShort { min });
    }

    if len > max {
        return Err(ValidationError::NameTooLong { max });
    }

    Ok(trimmed)
}
