use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::{production_order, stage::StageDirectory};

use super::{
    ApiErr, AppState,
    dto::{CreateOrderRequest, OrderResponse, UpdateOrderStageRequest},
    require_stage, resolve_stage_name,
};

pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiErr> {
    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    let orders = production_order::Entity::find()
        .order_by_asc(production_order::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderResponse::new(o, &stages))
            .collect(),
    ))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiErr> {
    if body.quantity < 0 {
        return Err(ApiErr::bad_request("quantity must not be negative"));
    }
    if body.product.trim().is_empty() {
        return Err(ApiErr::bad_request("product must not be empty"));
    }

    let stage = resolve_stage_name(&state.db, body.stage_name.as_deref()).await?;

    let duplicate = production_order::Entity::find()
        .filter(production_order::Column::Os.eq(body.os))
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    if duplicate.is_some() {
        return Err(ApiErr::conflict(format!(
            "OS '{}' already exists in the system. Duplicates are not allowed.",
            body.os
        )));
    }

    let model = production_order::ActiveModel {
        os: Set(body.os),
        product: Set(body.product),
        pattern: Set(body.pattern),
        quantity: Set(body.quantity),
        delivery_date: Set(body.delivery_date),
        customer: Set(body.customer.filter(|c| !c.trim().is_empty())),
        stage_id: Set(Some(stage.id)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(ApiErr::internal)?;

    tracing::info!(order_id = model.id, os = model.os, "order created");

    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok((StatusCode::CREATED, Json(OrderResponse::new(model, &stages))))
}

/// Moves an order to another stage. Tasks are left untouched.
pub async fn update_order_stage(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateOrderStageRequest>,
) -> Result<Json<OrderResponse>, ApiErr> {
    let order = production_order::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Order not found"))?;

    let stage = require_stage(&state.db, body.stage_id).await?;

    let mut active: production_order::ActiveModel = order.into();
    active.stage_id = Set(Some(stage.id));
    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;

    tracing::info!(order_id = id, stage = %stage.name, "order moved");

    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(OrderResponse::new(updated, &stages)))
}
