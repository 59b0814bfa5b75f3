use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::WideId;

/// Longest accepted course identifier.
pub const MAX_COURSE_ID_LEN: usize = 32;

/// Identifies one instance of a course being taught: a course offered by a
/// program in a given semester, section and year.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema, utoipa::IntoParams,
)]
#[into_params(parameter_in = Query)]
pub struct OfferingKey {
    #[schema(value_type = String, example = "1")]
    #[param(value_type = String)]
    pub program_id: WideId,
    #[schema(example = "CS101")]
    pub course_id: String,
    pub semester_id: i32,
    pub section_id: i32,
    #[schema(example = 2024)]
    pub year: i32,
}

impl OfferingKey {
    /// Check field shapes. Existence is checked by the store.
    pub fn validate(&self) -> Result<(), String> {
        validate_course_id(&self.course_id)?;
        if self.semester_id <= 0 {
            return Err("semester_id must be positive".into());
        }
        if self.section_id <= 0 {
            return Err("section_id must be positive".into());
        }
        if !(1..=9999).contains(&self.year) {
            return Err("year must be between 1 and 9999".into());
        }
        Ok(())
    }

    /// Copy of the key with surrounding whitespace removed from the course id.
    pub fn normalized(mut self) -> Self {
        self.course_id = self.course_id.trim().to_string();
        self
    }
}

impl fmt::Display for OfferingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "program {} / course {} / semester {} / section {} / year {}",
            self.program_id, self.course_id, self.semester_id, self.section_id, self.year
        )
    }
}

/// Course ids are caller supplied (e.g. `CS101`): non-empty after trimming,
/// bounded length, no interior whitespace.
pub fn validate_course_id(course_id: &str) -> Result<(), String> {
    let trimmed = course_id.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_COURSE_ID_LEN {
        return Err(format!(
            "course_id must be 1-{MAX_COURSE_ID_LEN} characters"
        ));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err("course_id must not contain whitespace".into());
    }
    Ok(())
}
