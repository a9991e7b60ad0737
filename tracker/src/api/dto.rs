use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::capacity::{StageCapacity, StageStatus};
use crate::entity::stage::{Sector, StageDirectory};
use crate::entity::task::TaskStatus;
use crate::entity::{employee, production_order, task};

// Request bodies also accept the field names used by the existing board
// front-end (`produto`, `etapa`, ...).

// ---------- order requests ----------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(alias = "OS")]
    pub os: i64,
    #[serde(alias = "produto")]
    pub product: String,
    #[serde(alias = "estampa")]
    pub pattern: String,
    #[serde(alias = "quantidade")]
    pub quantity: i32,
    #[serde(alias = "data_entrega")]
    pub delivery_date: NaiveDate,
    #[serde(default, alias = "cliente_final")]
    pub customer: Option<String>,
    #[serde(default, alias = "etapa")]
    pub stage_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStageRequest {
    #[serde(alias = "etapa_id")]
    pub stage_id: i32,
}

// ---------- order responses ----------

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderResponse {
    pub id: i32,
    pub os: i64,
    pub product: String,
    pub pattern: String,
    pub quantity: i32,
    pub delivery_date: NaiveDate,
    pub customer: Option<String>,
    pub stage_id: Option<i32>,
    pub stage_name: String,
}

impl OrderResponse {
    /// Null or dangling stage references are shown as the default stage.
    pub fn new(m: production_order::Model, stages: &StageDirectory) -> Self {
        let (stage_id, stage_name) = stages.label(m.stage_id);
        Self {
            id: m.id,
            os: m.os,
            product: m.product,
            pattern: m.pattern,
            quantity: m.quantity,
            delivery_date: m.delivery_date,
            customer: m.customer,
            stage_id,
            stage_name,
        }
    }
}

// ---------- employee requests / responses ----------

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "etapa")]
    pub stage_name: Option<String>,
    #[serde(alias = "producao_media")]
    pub average_output: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmployeeResponse {
    pub id: i32,
    pub name: String,
    pub stage_id: Option<i32>,
    pub stage_name: String,
    pub average_output: i32,
}

impl EmployeeResponse {
    pub fn new(m: employee::Model, stages: &StageDirectory) -> Self {
        let (stage_id, stage_name) = stages.label(m.stage_id);
        Self {
            id: m.id,
            name: m.name,
            stage_id,
            stage_name,
            average_output: m.average_output,
        }
    }
}

// ---------- stage responses ----------

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageResponse {
    pub id: i32,
    pub name: String,
    pub sector: Sector,
    pub required_capacity: i64,
    pub allocated_capacity: i64,
    pub status: StageStatus,
}

impl From<StageCapacity> for StageResponse {
    fn from(c: StageCapacity) -> Self {
        Self {
            id: c.stage.id,
            name: c.stage.name,
            sector: c.stage.sector,
            required_capacity: c.required,
            allocated_capacity: c.allocated,
            status: c.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageDetailResponse {
    #[serde(flatten)]
    pub stage: StageResponse,
    pub orders: Vec<StageOrderSummary>,
    pub employees: Vec<StageEmployeeSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageOrderSummary {
    pub id: i32,
    pub product: String,
    pub quantity: i32,
    pub delivery_date: NaiveDate,
}

impl From<production_order::Model> for StageOrderSummary {
    fn from(m: production_order::Model) -> Self {
        Self {
            id: m.id,
            product: m.product,
            quantity: m.quantity,
            delivery_date: m.delivery_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageEmployeeSummary {
    pub id: i32,
    pub name: String,
    pub average_output: i32,
}

impl From<employee::Model> for StageEmployeeSummary {
    fn from(m: employee::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            average_output: m.average_output,
        }
    }
}

// ---------- task requests ----------

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(alias = "etapa_id")]
    pub stage_id: i32,
    #[serde(alias = "descricao")]
    pub description: String,
    /// Defaults to the order quantity.
    #[serde(default, alias = "quantidade")]
    pub quantity: Option<i32>,
}

/// One slot per updatable attribute; unrecognised keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub status: Option<TaskStatus>,
    #[serde(alias = "etapa_id")]
    pub stage_id: Option<i32>,
    #[serde(alias = "quantidade")]
    pub quantity: Option<i32>,
    #[serde(alias = "descricao")]
    pub description: Option<String>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.stage_id.is_none()
            && self.quantity.is_none()
            && self.description.is_none()
    }
}

// ---------- task responses ----------

/// Order fields shown next to a task in board-wide listings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskOrderContext {
    pub os: i64,
    pub product: String,
    pub pattern: String,
    pub delivery_date: NaiveDate,
}

impl From<&production_order::Model> for TaskOrderContext {
    fn from(m: &production_order::Model) -> Self {
        Self {
            os: m.os,
            product: m.product.clone(),
            pattern: m.pattern.clone(),
            delivery_date: m.delivery_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskResponse {
    pub id: i32,
    pub order_id: i32,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub order: Option<TaskOrderContext>,
    pub stage_id: i32,
    pub stage_name: String,
    pub description: String,
    pub quantity: i32,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TaskResponse {
    pub fn new(
        m: task::Model,
        stages: &StageDirectory,
        order: Option<&production_order::Model>,
    ) -> Self {
        let stage_name = stages
            .get(m.stage_id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let status = m.status();
        Self {
            id: m.id,
            order_id: m.order_id,
            order: order.map(TaskOrderContext::from),
            stage_id: m.stage_id,
            stage_name,
            description: m.description,
            quantity: m.quantity,
            status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------- import responses ----------

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    pub inserted: u64,
    pub errors: Vec<String>,
}
