//! Field rules shared by the step validators.

/// Trimmed value, or `None` if blank
#[must_use]
pub fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Trimmed value, or `None` if blank, as an owned string
#[must_use]
pub fn optional(value: &str) -> Option<String> {
    required(value).map(str::to_string)
}

/// Parse a whole number of at least 1
///
/// # Errors
///
/// Returns the rejection message.
pub fn positive_count(value: &str, label: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(format!("{label} must be a whole number of at least 1")),
    }
}

/// Parse an optional coordinate within `[-limit, limit]`
///
/// # Errors
///
/// Returns the rejection message.
pub fn coordinate(value: &str, label: &str, limit: f64) -> Result<Option<f64>, String> {
    let Some(value) = required(value) else {
        return Ok(None);
    };

    match value.parse::<f64>() {
        Ok(degrees) if degrees.is_finite() && (-limit..=limit).contains(&degrees) => Ok(Some(degrees)),
        _ => Err(format!("{label} must be a number between -{limit} and {limit}")),
    }
}

/// Parse a whole percentage in `[0, 100]`
///
/// # Errors
///
/// Returns the rejection message.
pub fn percentage(value: &str) -> Result<u8, String> {
    match value.trim().parse::<u8>() {
        Ok(percent) if percent <= 100 => Ok(percent),
        _ => Err("Discount must be a whole number between 0 and 100".to_string()),
    }
}
