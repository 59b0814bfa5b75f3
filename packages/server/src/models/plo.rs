use common::WideId;
use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::entity::plo;
use crate::error::AppError;

#[derive(Clone, Deserialize, utoipa::ToSchema)]
pub struct CreatePloRequest {
    /// Program the new PLO belongs to. Must already exist.
    #[schema(value_type = String, example = "1")]
    pub program_id: WideId,
    #[schema(example = "PLO1")]
    pub code: String,
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePloRequest {
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportPlosRequest {
    pub rows: Vec<CreatePloRequest>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PloResponse {
    #[schema(value_type = String, example = "1")]
    pub id: WideId,
    pub code: String,
    pub name: String,
    pub engname: String,
}

impl From<plo::Model> for PloResponse {
    fn from(m: plo::Model) -> Self {
        Self {
            id: m.id.into(),
            code: m.code,
            name: m.name,
            engname: m.engname,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportPlosResponse {
    pub imported: usize,
    pub plos: Vec<PloResponse>,
}

pub fn validate_create_plo(req: &CreatePloRequest) -> Result<(), AppError> {
    validate_text("code", &req.code)?;
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)
}

pub fn validate_update_plo(req: &UpdatePloRequest) -> Result<(), AppError> {
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)
}
