use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// Dashboard personalisation of one user. One row per `user_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: String,
    /// JSON array of metric keys pinned to the top of the dashboard.
    #[sea_orm(column_type = "Text")]
    pub pinned_metrics: String,
    /// JSON array of dashboard section names.
    #[sea_orm(column_type = "Text")]
    pub favorite_sections: String,
    #[sea_orm(column_type = "Text")]
    pub notification_settings: String,
    #[sea_orm(column_type = "Text")]
    pub display_settings: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
