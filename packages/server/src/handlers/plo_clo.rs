use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{clo, plo, plo_clo};
use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::mapping::{PloCloQuery, PloCloResponse};
use crate::models::shared::parse_id_list;
use crate::state::AppState;

/// Upper bound on ids in one report request.
const MAX_CLO_IDS: usize = 1000;

#[utoipa::path(
    get,
    path = "/plo-clos",
    tag = "PLO-CLO",
    operation_id = "listPloClos",
    summary = "Report how CLOs map onto PLOs",
    params(PloCloQuery),
    responses(
        (status = 200, description = "Mappings of the requested CLOs", body = Vec<PloCloResponse>),
        (status = 400, description = "Missing or malformed clo_ids (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_plo_clos(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PloCloQuery>,
) -> Result<Json<Vec<PloCloResponse>>, AppError> {
    let clo_ids = parse_id_list(&query.clo_ids, "clo_ids", MAX_CLO_IDS)?;

    let rows = plo_clo::Entity::find()
        .filter(plo_clo::Column::CloId.is_in(clo_ids.clone()))
        .find_also_related(plo::Entity)
        .order_by_asc(plo_clo::Column::CloId)
        .order_by_asc(plo_clo::Column::PloId)
        .all(&state.db)
        .await?;

    let clos: HashMap<i64, clo::Model> = clo::Entity::find()
        .filter(clo::Column::Id.is_in(clo_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let items = rows
        .into_iter()
        .map(|(m, plo)| {
            let (plo_code, plo_name) = plo.map(|p| (p.code, p.name)).unwrap_or_default();
            let (clo_code, clo_name) = clos
                .get(&m.clo_id)
                .map(|c| (c.code.clone(), c.name.clone()))
                .unwrap_or_default();
            PloCloResponse {
                id: m.id.into(),
                plo_id: m.plo_id.into(),
                plo_code,
                plo_name,
                clo_id: m.clo_id.into(),
                clo_code,
                clo_name,
                weight: m.weight,
                course_id: m.course_id,
                semester_id: m.semester_id,
                section_id: m.section_id,
                year: m.year,
            }
        })
        .collect();

    Ok(Json(items))
}
