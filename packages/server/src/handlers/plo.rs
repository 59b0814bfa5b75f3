use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::upsert::{Prerequisite, UpsertPlan, run_batch};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{plo, program, program_plo};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::plo::*;
use crate::models::shared::{at_row, validate_batch_size};
use crate::state::AppState;

/// Insert a PLO and link it to its program, which must exist.
fn plo_plan(req: CreatePloRequest) -> UpsertPlan<plo::Model> {
    let program_id = req.program_id.get();
    UpsertPlan::new("add plo")
        .prerequisite(Prerequisite::<program::ActiveModel>::reject(
            format!("program {program_id}"),
            Condition::all().add(program::Column::Id.eq(program_id)),
        ))
        .then(move |txn| {
            Box::pin(async move {
                let model = plo::ActiveModel {
                    code: Set(req.code.trim().to_string()),
                    name: Set(req.name.trim().to_string()),
                    engname: Set(req.engname.trim().to_string()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                program_plo::ActiveModel {
                    program_id: Set(program_id),
                    plo_id: Set(model.id),
                }
                .insert(txn)
                .await?;

                Ok(model)
            })
        })
}

#[utoipa::path(
    post,
    path = "/plos",
    tag = "PLOs",
    operation_id = "createPlo",
    summary = "Create a PLO within a program",
    request_body = CreatePloRequest,
    responses(
        (status = 201, description = "PLO created and linked", body = PloResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(program_id = %payload.program_id, code = %payload.code))]
pub async fn create_plo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePloRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_plo(&payload)?;

    let applied = plo_plan(payload).run(&state.db).await?;

    Ok((StatusCode::CREATED, Json(PloResponse::from(applied.value))))
}

#[utoipa::path(
    post,
    path = "/plos/import",
    tag = "PLOs",
    operation_id = "importPlos",
    summary = "Create many PLOs at once",
    description = "Validates every row first, then creates all PLOs in one transaction. Any failing row rolls back the whole batch; the error names the row (1-based).",
    request_body = ImportPlosRequest,
    responses(
        (status = 201, description = "All rows imported", body = ImportPlosResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "A row references a missing program (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(rows = payload.rows.len()))]
pub async fn import_plos(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImportPlosRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_batch_size(payload.rows.len(), state.config.curriculum.max_import_rows)?;
    for (i, row) in payload.rows.iter().enumerate() {
        validate_create_plo(row).map_err(|e| at_row(i, e))?;
    }

    let plans = payload.rows.into_iter().map(plo_plan).collect();
    let applied = run_batch(&state.db, "import plos", plans).await?;

    let plos: Vec<PloResponse> = applied.into_iter().map(|a| a.value.into()).collect();
    Ok((
        StatusCode::CREATED,
        Json(ImportPlosResponse {
            imported: plos.len(),
            plos,
        }),
    ))
}
