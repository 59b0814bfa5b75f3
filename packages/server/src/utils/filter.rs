//! Allow-listed query filters.
//!
//! A filterable resource declares which query parameters it accepts, which
//! column each one maps to, and how its value is parsed. Anything outside
//! the list is rejected before a query is built, and values are always
//! bound as parameters.

use std::collections::BTreeMap;

use common::WideId;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::program_course;
use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    BigInt,
    Text,
}

/// One accepted query parameter.
#[derive(Clone, Copy, Debug)]
pub struct FilterField<C: 'static> {
    pub param: &'static str,
    pub column: C,
    pub kind: ValueKind,
}

/// Parameters accepted by `GET /offerings`.
pub const OFFERING_FILTERS: &[FilterField<program_course::Column>] = &[
    FilterField {
        param: "program_id",
        column: program_course::Column::ProgramId,
        kind: ValueKind::BigInt,
    },
    FilterField {
        param: "course_id",
        column: program_course::Column::CourseId,
        kind: ValueKind::Text,
    },
    FilterField {
        param: "semester_id",
        column: program_course::Column::SemesterId,
        kind: ValueKind::Int,
    },
    FilterField {
        param: "section_id",
        column: program_course::Column::SectionId,
        kind: ValueKind::Int,
    },
    FilterField {
        param: "year",
        column: program_course::Column::Year,
        kind: ValueKind::Int,
    },
];

/// Build an equality conjunction from raw query parameters.
///
/// Blank values are treated as absent.
pub fn build_filter<C>(
    fields: &[FilterField<C>],
    params: &BTreeMap<String, String>,
) -> Result<Condition, AppError>
where
    C: ColumnTrait + Copy,
{
    let mut cond = Condition::all();
    for (name, raw) in params {
        let field = fields
            .iter()
            .find(|f| f.param == name)
            .ok_or_else(|| AppError::Validation(format!("Unknown filter parameter: {name}")))?;

        let value = raw.trim();
        if value.is_empty() {
            continue;
        }

        cond = match field.kind {
            ValueKind::Int => {
                let v: i32 = value.parse().map_err(|_| invalid(name, "an integer"))?;
                cond.add(field.column.eq(v))
            }
            ValueKind::BigInt => {
                let v: WideId = value.parse().map_err(|_| invalid(name, "an integer id"))?;
                cond.add(field.column.eq(v.get()))
            }
            ValueKind::Text => cond.add(field.column.eq(value.to_string())),
        };
    }
    Ok(cond)
}

fn invalid(name: &str, expected: &str) -> AppError {
    AppError::Validation(format!("Filter parameter {name} must be {expected}"))
}
