use std::collections::HashMap;

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};

/// Name of the stage that orders without a stage are displayed under.
pub const DEFAULT_STAGE_NAME: &str = "OS no email";

/// Board column group. Stored with the legacy Portuguese labels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Sector {
    #[sea_orm(string_value = "Inicio")]
    Start,
    #[sea_orm(string_value = "Producao")]
    Production,
    #[sea_orm(string_value = "Expedicao")]
    Shipping,
    #[sea_orm(string_value = "Fim")]
    End,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stage")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub sector: Sector,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::production_order::Entity")]
    ProductionOrder,
    #[sea_orm(has_many = "super::employee::Entity")]
    Employee,
    #[sea_orm(has_many = "super::task::Entity")]
    Task,
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Looks a stage up by its display name. Surrounding whitespace is ignored.
pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Name.eq(name.trim()))
        .one(db)
        .await
}

/// All stages keyed by id, loaded once per request for display lookups.
#[derive(Clone, Debug, Default)]
pub struct StageDirectory {
    by_id: HashMap<i32, Model>,
    fallback: Option<Model>,
}

impl StageDirectory {
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self, DbErr> {
        let stages = Entity::find().order_by_asc(Column::Id).all(db).await?;
        Ok(Self::new(stages))
    }

    pub fn new(stages: Vec<Model>) -> Self {
        let fallback = stages
            .iter()
            .filter(|s| s.sector == Sector::Start)
            .min_by_key(|s| s.id)
            .cloned();
        let by_id = stages.into_iter().map(|s| (s.id, s)).collect();
        Self { by_id, fallback }
    }

    pub fn get(&self, id: i32) -> Option<&Model> {
        self.by_id.get(&id)
    }

    /// The first stage of the Start sector, shown for missing references.
    pub fn fallback(&self) -> Option<&Model> {
        self.fallback.as_ref()
    }

    /// Stage to display for a reference that may be null or dangling.
    pub fn display(&self, stage_id: Option<i32>) -> Option<&Model> {
        stage_id.and_then(|id| self.get(id)).or(self.fallback())
    }

    /// `(id, name)` pair for listings; the name falls back to
    /// [`DEFAULT_STAGE_NAME`] even on an empty directory.
    pub fn label(&self, stage_id: Option<i32>) -> (Option<i32>, String) {
        match self.display(stage_id) {
            Some(stage) => (Some(stage.id), stage.name.clone()),
            None => (None, DEFAULT_STAGE_NAME.to_string()),
        }
    }
}
