use axum::{
    extract::{Path, State},
    response::Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::capacity;
use crate::entity::{employee, production_order};

use super::{
    ApiErr, AppState,
    dto::{StageDetailResponse, StageResponse},
};

/// Every stage with its capacity balance, in board order.
pub async fn list_stages(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageResponse>>, ApiErr> {
    let stages = capacity::stage_capacities(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(stages.into_iter().map(StageResponse::from).collect()))
}

/// One stage with the orders sitting at it and the people assigned to it.
pub async fn get_stage(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StageDetailResponse>, ApiErr> {
    let stage = capacity::stage_capacity(&state.db, id)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Stage not found"))?;

    let orders = production_order::Entity::find()
        .filter(production_order::Column::StageId.eq(id))
        .order_by_asc(production_order::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    let employees = employee::Entity::find()
        .filter(employee::Column::StageId.eq(id))
        .order_by_asc(employee::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(StageDetailResponse {
        stage: stage.into(),
        orders: orders.into_iter().map(Into::into).collect(),
        employees: employees.into_iter().map(Into::into).collect(),
    }))
}
