use common::WideId;
use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::entity::program;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProgramRequest {
    #[schema(example = "Computer Engineering")]
    pub name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LinkPlosRequest {
    /// Existing PLOs to attach to the program.
    #[schema(value_type = Vec<String>)]
    pub plo_ids: Vec<WideId>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgramResponse {
    #[schema(value_type = String, example = "1")]
    pub id: WideId,
    pub name: String,
}

impl From<program::Model> for ProgramResponse {
    fn from(m: program::Model) -> Self {
        Self {
            id: m.id.into(),
            name: m.name,
        }
    }
}

pub fn validate_program(req: &ProgramRequest) -> Result<(), AppError> {
    validate_text("name", &req.name)
}

pub fn validate_link_plos(req: &LinkPlosRequest, max: usize) -> Result<(), AppError> {
    if req.plo_ids.is_empty() {
        return Err(AppError::Validation("plo_ids must not be empty".into()));
    }
    if req.plo_ids.len() > max {
        return Err(AppError::Validation(format!("Too many plo_ids: max {max}")));
    }
    Ok(())
}
