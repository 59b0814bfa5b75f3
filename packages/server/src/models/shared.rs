use std::collections::HashSet;

use common::WideId;
use common::offering::validate_course_id;

use crate::error::AppError;

/// Longest accepted name, code or description.
pub const MAX_TEXT_LEN: usize = 512;

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a required text field after trimming (1..=MAX_TEXT_LEN chars).
pub fn validate_text(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_course(course_id: &str) -> Result<(), AppError> {
    validate_course_id(course_id).map_err(AppError::Validation)
}

/// Weights must be finite and non-negative.
pub fn validate_weight(weight: f64) -> Result<(), AppError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(AppError::Validation(
            "weight must be a non-negative number".into(),
        ));
    }
    Ok(())
}

/// Validate the size of an import batch.
pub fn validate_batch_size(len: usize, max: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::Validation("rows must not be empty".into()));
    }
    if len > max {
        return Err(AppError::Validation(format!("Too many rows: max {max}")));
    }
    Ok(())
}

/// Prefix a row validation error with its one-based position.
pub fn at_row(row: usize, err: AppError) -> AppError {
    match err {
        AppError::Validation(msg) => AppError::Validation(format!("Row {}: {msg}", row + 1)),
        other => other,
    }
}

/// Parse a comma-separated id list such as `1,2,3` (non-empty, no duplicates).
pub fn parse_id_list(raw: &str, name: &str, max: usize) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: WideId = part
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid {name}: {part}")))?;
        if seen.insert(id) {
            ids.push(id.get());
        }
    }
    if ids.is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }
    if ids.len() > max {
        return Err(AppError::Validation(format!("Too many {name}: max {max}")));
    }
    Ok(ids)
}
