use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create saved_scenarios table
        manager
            .create_table(
                Table::create()
                    .table(SavedScenarios::Table)
                    .if_not_exists()
                    .col(pk_auto(SavedScenarios::Id))
                    .col(string(SavedScenarios::UserId))
                    .col(string(SavedScenarios::Name))
                    .col(string_null(SavedScenarios::Description))
                    .col(text(SavedScenarios::ScenarioData))
                    .col(text_null(SavedScenarios::Results))
                    .col(text(SavedScenarios::Tags).default("[]"))
                    .col(boolean(SavedScenarios::IsFavorite).default(false))
                    .col(date_time(SavedScenarios::CreatedAt))
                    .col(date_time(SavedScenarios::UpdatedAt))
                    .col(date_time_null(SavedScenarios::LastViewedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_saved_scenarios_user_id")
                    .table(SavedScenarios::Table)
                    .col(SavedScenarios::UserId)
                    .to_owned(),
            )
            .await?;

        // Create user_preferences table
        manager
            .create_table(
                Table::create()
                    .table(UserPreferences::Table)
                    .if_not_exists()
                    .col(pk_auto(UserPreferences::Id))
                    .col(string(UserPreferences::UserId).unique_key())
                    .col(text(UserPreferences::PinnedMetrics).default("[]"))
                    .col(text(UserPreferences::FavoriteSections).default("[]"))
                    .col(text(UserPreferences::NotificationSettings))
                    .col(text(UserPreferences::DisplaySettings))
                    .col(date_time(UserPreferences::CreatedAt))
                    .col(date_time(UserPreferences::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create notifications table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Notifications::Id))
                    .col(string(Notifications::UserId))
                    .col(string_len(Notifications::Kind, 16))
                    .col(string_len(Notifications::Category, 32))
                    .col(string(Notifications::Title))
                    .col(text(Notifications::Message))
                    .col(string_null(Notifications::RelatedMetric))
                    .col(string_len(Notifications::Priority, 16).default("medium"))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(boolean(Notifications::IsDismissed).default(false))
                    .col(date_time(Notifications::CreatedAt))
                    .col(date_time_null(Notifications::ReadAt))
                    .col(date_time_null(Notifications::ExpiresAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserPreferences::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SavedScenarios::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum SavedScenarios {
    Table,
    Id,
    UserId,
    Name,
    Description,
    ScenarioData,
    Results,
    Tags,
    IsFavorite,
    CreatedAt,
    UpdatedAt,
    LastViewedAt,
}

#[derive(DeriveIden)]
enum UserPreferences {
    Table,
    Id,
    UserId,
    PinnedMetrics,
    FavoriteSections,
    NotificationSettings,
    DisplaySettings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Category,
    Title,
    Message,
    RelatedMetric,
    Priority,
    IsRead,
    IsDismissed,
    CreatedAt,
    ReadAt,
    ExpiresAt,
}
