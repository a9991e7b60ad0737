use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

use crate::entity::{employee, stage::StageDirectory};

use super::{
    ApiErr, AppState,
    dto::{CreateEmployeeRequest, EmployeeResponse},
    resolve_stage_name,
};

pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeResponse>>, ApiErr> {
    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    let employees = employee::Entity::find()
        .order_by_asc(employee::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(
        employees
            .into_iter()
            .map(|e| EmployeeResponse::new(e, &stages))
            .collect(),
    ))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiErr> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiErr::bad_request("name must not be empty"));
    }
    if body.average_output < 0 {
        return Err(ApiErr::bad_request("average_output must not be negative"));
    }

    let stage = resolve_stage_name(&state.db, body.stage_name.as_deref()).await?;

    let model = employee::ActiveModel {
        name: Set(name.to_string()),
        stage_id: Set(Some(stage.id)),
        average_output: Set(body.average_output),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(ApiErr::internal)?;

    tracing::info!(employee_id = model.id, "employee created");

    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok((StatusCode::CREATED, Json(EmployeeResponse::new(model, &stages))))
}
