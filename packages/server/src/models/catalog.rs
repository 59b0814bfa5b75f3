use serde::Serialize;

use crate::entity::{section, semester};

#[derive(Serialize, utoipa::ToSchema)]
pub struct SemesterResponse {
    pub id: i32,
    pub name: String,
}

impl From<semester::Model> for SemesterResponse {
    fn from(m: semester::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SectionResponse {
    pub id: i32,
    pub name: Option<String>,
}

impl From<section::Model> for SectionResponse {
    fn from(m: section::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
