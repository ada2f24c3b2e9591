use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// A named set of scenario factors a user chose to keep.
///
/// `scenario_data`, `results` and `tags` hold JSON documents; the shape is
/// owned by the API layer, the database only stores text.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "saved_scenarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Opaque identifier of the owning user.
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// The eleven factor values.
    #[sea_orm(column_type = "Text")]
    pub scenario_data: String,
    /// Metrics computed from `scenario_data` when the scenario was saved.
    #[sea_orm(column_type = "Text", nullable)]
    pub results: Option<String>,
    /// JSON array of free-form labels.
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    #[sea_orm(default_value = "false")]
    pub is_favorite: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_viewed_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
