use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum NotificationKind {
    #[sea_orm(string_value = "alert")]
    Alert,
    #[sea_orm(string_value = "info")]
    Info,
    #[sea_orm(string_value = "warning")]
    Warning,
    #[sea_orm(string_value = "success")]
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum NotificationCategory {
    #[sea_orm(string_value = "metric_threshold")]
    MetricThreshold,
    #[sea_orm(string_value = "system")]
    System,
    #[sea_orm(string_value = "insight")]
    Insight,
    #[sea_orm(string_value = "report")]
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum NotificationPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

/// A message shown in the dashboard notification center.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub kind: NotificationKind,
    pub category: NotificationCategory,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Metric key the notification is about, if any.
    pub related_metric: Option<String>,
    pub priority: NotificationPriority,
    #[sea_orm(default_value = "false")]
    pub is_read: bool,
    #[sea_orm(default_value = "false")]
    pub is_dismissed: bool,
    pub created_at: NaiveDateTime,
    pub read_at: Option<NaiveDateTime>,
    /// Hidden from the active list once this moment has passed.
    pub expires_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
