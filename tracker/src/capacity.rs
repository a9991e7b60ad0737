//! Stage capacity balance.
//!
//! For each stage, `required` is the total quantity of the orders sitting at
//! that stage and `allocated` is the total average output of the employees
//! assigned to it. The two sums are aggregated by separate `GROUP BY` queries
//! and joined in memory, so neither side is multiplied by the row count of the
//! other. Orders and employees without a stage count towards no stage.

use std::cmp::Ordering;
use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entity::{employee, production_order, stage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// More work queued than the assigned people produce.
    Overloaded,
    Idle,
    Balanced,
}

impl StageStatus {
    pub fn classify(required: i64, allocated: i64) -> Self {
        match required.cmp(&allocated) {
            Ordering::Greater => StageStatus::Overloaded,
            Ordering::Less => StageStatus::Idle,
            Ordering::Equal => StageStatus::Balanced,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageCapacity {
    pub stage: stage::Model,
    pub required: i64,
    pub allocated: i64,
    pub status: StageStatus,
}

impl StageCapacity {
    pub fn new(stage: stage::Model, required: i64, allocated: i64) -> Self {
        Self {
            stage,
            required,
            allocated,
            status: StageStatus::classify(required, allocated),
        }
    }
}

/// Pairs every stage with its sums; stages missing from a map get 0.
pub fn tally(
    stages: Vec<stage::Model>,
    required: &HashMap<i32, i64>,
    allocated: &HashMap<i32, i64>,
) -> Vec<StageCapacity> {
    stages
        .into_iter()
        .map(|s| {
            let req = required.get(&s.id).copied().unwrap_or(0);
            let alloc = allocated.get(&s.id).copied().unwrap_or(0);
            StageCapacity::new(s, req, alloc)
        })
        .collect()
}

/// All stages in board order with their capacity balance.
pub async fn stage_capacities<C: ConnectionTrait>(db: &C) -> Result<Vec<StageCapacity>, DbErr> {
    let stages = stage::Entity::find()
        .order_by_asc(stage::Column::Id)
        .all(db)
        .await?;
    let required = required_by_stage(db, None).await?;
    let allocated = allocated_by_stage(db, None).await?;
    Ok(tally(stages, &required, &allocated))
}

/// Capacity balance of one stage, `None` if the stage does not exist.
pub async fn stage_capacity<C: ConnectionTrait>(
    db: &C,
    stage_id: i32,
) -> Result<Option<StageCapacity>, DbErr> {
    let Some(stage) = stage::Entity::find_by_id(stage_id).one(db).await? else {
        return Ok(None);
    };
    let required = required_by_stage(db, Some(stage_id)).await?;
    let allocated = allocated_by_stage(db, Some(stage_id)).await?;
    Ok(tally(vec![stage], &required, &allocated).pop())
}

async fn required_by_stage<C: ConnectionTrait>(
    db: &C,
    only: Option<i32>,
) -> Result<HashMap<i32, i64>, DbErr> {
    let mut query = production_order::Entity::find()
        .select_only()
        .column(production_order::Column::StageId)
        .column_as(production_order::Column::Quantity.sum(), "total")
        .filter(production_order::Column::StageId.is_not_null())
        .group_by(production_order::Column::StageId);
    if let Some(id) = only {
        query = query.filter(production_order::Column::StageId.eq(id));
    }

    let rows: Vec<(Option<i32>, Option<i64>)> = query.into_tuple().all(db).await?;
    Ok(collect_sums(rows))
}

async fn allocated_by_stage<C: ConnectionTrait>(
    db: &C,
    only: Option<i32>,
) -> Result<HashMap<i32, i64>, DbErr> {
    let mut query = employee::Entity::find()
        .select_only()
        .column(employee::Column::StageId)
        .column_as(employee::Column::AverageOutput.sum(), "total")
        .filter(employee::Column::StageId.is_not_null())
        .group_by(employee::Column::StageId);
    if let Some(id) = only {
        query = query.filter(employee::Column::StageId.eq(id));
    }

    let rows: Vec<(Option<i32>, Option<i64>)> = query.into_tuple().all(db).await?;
    Ok(collect_sums(rows))
}

fn collect_sums(rows: Vec<(Option<i32>, Option<i64>)>) -> HashMap<i32, i64> {
    rows.into_iter()
        .filter_map(|(id, total)| Some((id?, total.unwrap_or(0))))
        .collect()
}
