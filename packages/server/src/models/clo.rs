use chrono::{DateTime, Utc};
use common::{OfferingKey, WideId};
use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::entity::clo;
use crate::error::AppError;

#[derive(Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateCloRequest {
    /// Offering the CLO is created for. Must already exist.
    #[serde(flatten)]
    pub offering: OfferingKey,
    #[schema(example = "CLO1")]
    pub code: String,
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCloRequest {
    #[serde(flatten)]
    pub offering: OfferingKey,
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportClosRequest {
    pub rows: Vec<CreateCloRequest>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateCloResponse {
    #[schema(value_type = String, example = "1")]
    pub clo_id: WideId,
    #[schema(value_type = String, example = "1")]
    pub course_clo_id: WideId,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportClosResponse {
    pub imported: usize,
    pub clos: Vec<CreateCloResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LinkCloResponse {
    #[schema(value_type = String)]
    pub course_clo_id: WideId,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteCloLinkResponse {
    #[schema(value_type = String)]
    pub clo_id: WideId,
    /// True when the removed link was the last one and the CLO was deleted too.
    pub clo_deleted: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CloResponse {
    #[schema(value_type = String, example = "1")]
    pub id: WideId,
    pub code: String,
    pub name: String,
    pub engname: String,
    pub created_at: DateTime<Utc>,
}

impl From<clo::Model> for CloResponse {
    fn from(m: clo::Model) -> Self {
        Self {
            id: m.id.into(),
            code: m.code,
            name: m.name,
            engname: m.engname,
            created_at: m.created_at,
        }
    }
}

/// Trim and check a create request. Returns the normalized request.
pub fn validate_create_clo(req: CreateCloRequest) -> Result<CreateCloRequest, AppError> {
    let offering = req.offering.normalized();
    offering.validate().map_err(AppError::Validation)?;
    validate_text("code", &req.code)?;
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)?;
    Ok(CreateCloRequest { offering, ..req })
}

pub fn validate_update_clo(req: UpdateCloRequest) -> Result<UpdateCloRequest, AppError> {
    let offering = req.offering.normalized();
    offering.validate().map_err(AppError::Validation)?;
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)?;
    Ok(UpdateCloRequest { offering, ..req })
}

/// Trim and check an offering key given as query parameters or a body.
pub fn validate_offering_key(key: OfferingKey) -> Result<OfferingKey, AppError> {
    let key = key.normalized();
    key.validate().map_err(AppError::Validation)?;
    Ok(key)
}
