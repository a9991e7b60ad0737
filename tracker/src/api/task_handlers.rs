use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entity::{
    production_order,
    stage::{self, StageDirectory},
    task::{self, TaskStatus},
};

use super::{
    ApiErr, AppState,
    dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest},
    require_stage,
};

// ---------- listings ----------

pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErr> {
    let tasks = task::Entity::find()
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(with_order_context(&state.db, tasks).await?))
}

pub async fn list_order_tasks(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Vec<TaskResponse>>, ApiErr> {
    find_order(&state.db, order_id).await?;

    let tasks = task::Entity::find()
        .filter(task::Column::OrderId.eq(order_id))
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(
        tasks
            .into_iter()
            .map(|t| TaskResponse::new(t, &stages, None))
            .collect(),
    ))
}

/// Open work at a stage: every task there that is not yet done.
pub async fn list_stage_tasks(
    State(state): State<AppState>,
    Path(stage_id): Path<i32>,
) -> Result<Json<Vec<TaskResponse>>, ApiErr> {
    stage::Entity::find_by_id(stage_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Stage not found"))?;

    let tasks = task::Entity::find()
        .filter(task::Column::StageId.eq(stage_id))
        .filter(task::Column::Status.ne(TaskStatus::Done.as_str()))
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(with_order_context(&state.db, tasks).await?))
}

async fn with_order_context(
    db: &DatabaseConnection,
    tasks: Vec<task::Model>,
) -> Result<Vec<TaskResponse>, ApiErr> {
    let stages = StageDirectory::load(db).await.map_err(ApiErr::internal)?;

    let order_ids: HashSet<i32> = tasks.iter().map(|t| t.order_id).collect();
    let orders: HashMap<i32, production_order::Model> = production_order::Entity::find()
        .filter(production_order::Column::Id.is_in(order_ids))
        .all(db)
        .await
        .map_err(ApiErr::internal)?
        .into_iter()
        .map(|o| (o.id, o))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|t| {
            let order = orders.get(&t.order_id);
            TaskResponse::new(t, &stages, order)
        })
        .collect())
}

async fn find_order(
    db: &DatabaseConnection,
    order_id: i32,
) -> Result<production_order::Model, ApiErr> {
    production_order::Entity::find_by_id(order_id)
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Order not found"))
}

// ---------- writes ----------

/// Creates a batch of tasks for one order. Every referenced stage is checked
/// before anything is written; the inserts share one transaction.
pub async fn create_order_tasks(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(body): Json<Vec<CreateTaskRequest>>,
) -> Result<(StatusCode, Json<Vec<TaskResponse>>), ApiErr> {
    let order = find_order(&state.db, order_id).await?;

    for item in &body {
        require_stage(&state.db, item.stage_id).await?;
        if item.quantity.is_some_and(|q| q < 0) {
            return Err(ApiErr::bad_request("quantity must not be negative"));
        }
    }

    let txn = state.db.begin().await.map_err(ApiErr::internal)?;
    let now = Utc::now().naive_utc();
    let mut created = Vec::with_capacity(body.len());
    for item in body {
        let model = task::ActiveModel {
            order_id: Set(order.id),
            stage_id: Set(item.stage_id),
            description: Set(item.description),
            quantity: Set(item.quantity.unwrap_or(order.quantity)),
            status: Set(TaskStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ApiErr::internal)?;
        created.push(model);
    }
    txn.commit().await.map_err(ApiErr::internal)?;

    tracing::info!(order_id, count = created.len(), "tasks created");

    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok((
        StatusCode::CREATED,
        Json(
            created
                .into_iter()
                .map(|t| TaskResponse::new(t, &stages, None))
                .collect(),
        ),
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiErr> {
    let existing = task::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Task not found"))?;

    if body.is_empty() {
        return Err(ApiErr::bad_request("No fields to update"));
    }

    let mut active: task::ActiveModel = existing.into();

    if let Some(stage_id) = body.stage_id {
        require_stage(&state.db, stage_id).await?;
        active.stage_id = Set(stage_id);
    }
    if let Some(quantity) = body.quantity {
        if quantity < 0 {
            return Err(ApiErr::bad_request("quantity must not be negative"));
        }
        active.quantity = Set(quantity);
    }
    if let Some(status) = body.status {
        active.status = Set(status.into());
    }
    if let Some(description) = body.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;

    let stages = StageDirectory::load(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(TaskResponse::new(updated, &stages, None)))
}
