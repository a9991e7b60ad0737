use sea_orm::entity::prelude::*;

/// A production order ("OS").
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "production_order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Business-facing order number.
    pub os: i64,
    pub product: String,
    /// Print / pattern name ("estampa").
    pub pattern: String,
    pub quantity: i32,
    pub delivery_date: Date,
    pub customer: Option<String>,
    /// None for legacy rows; listed under the default stage.
    pub stage_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stage::Entity",
        from = "Column::StageId",
        to = "super::stage::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Stage,
    #[sea_orm(has_many = "super::task::Entity")]
    Task,
}

impl Related<super::stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stage.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
