//! SeaORM entities for the per-user dashboard data.
//!
//! Every table is keyed by an opaque `user_id` string minted by the API; there
//! is no user table and no foreign key to one.

pub mod notification;
pub mod saved_scenario;
pub mod user_preference;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::notification::Entity as Notification;
    pub use super::saved_scenario::Entity as SavedScenario;
    pub use super::user_preference::Entity as UserPreference;
}

#[cfg(test)]
mod test {
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        QueryFilter, QueryOrder, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn timestamp(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_saved_scenarios_are_scoped_per_user() -> Result<(), DbErr> {
        let db = setup_db().await?;

        for (user, name, day) in [
            ("user_a", "Food shock", 1),
            ("user_a", "Donor surge", 2),
            ("user_b", "Baseline", 3),
        ] {
            saved_scenario::ActiveModel {
                user_id: Set(user.to_string()),
                name: Set(name.to_string()),
                description: Set(None),
                scenario_data: Set("{}".to_string()),
                results: Set(None),
                tags: Set("[]".to_string()),
                is_favorite: Set(false),
                created_at: Set(timestamp(day)),
                updated_at: Set(timestamp(day)),
                last_viewed_at: Set(None),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let user_a = SavedScenario::find()
            .filter(saved_scenario::Column::UserId.eq("user_a"))
            .order_by_desc(saved_scenario::Column::CreatedAt)
            .all(&db)
            .await?;

        assert_eq!(user_a.len(), 2);
        assert_eq!(user_a[0].name, "Donor surge");
        assert_eq!(user_a[1].name, "Food shock");

        Ok(())
    }

    #[tokio::test]
    async fn test_user_preferences_unique_per_user() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let make = || user_preference::ActiveModel {
            user_id: Set("user_a".to_string()),
            pinned_metrics: Set("[]".to_string()),
            favorite_sections: Set("[\"executive\"]".to_string()),
            notification_settings: Set("{}".to_string()),
            display_settings: Set("{}".to_string()),
            created_at: Set(timestamp(1)),
            updated_at: Set(timestamp(1)),
            ..Default::default()
        };

        make().insert(&db).await?;
        assert!(make().insert(&db).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_notification_enums_round_trip_through_database() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let inserted = notification::ActiveModel {
            user_id: Set("user_a".to_string()),
            kind: Set(notification::NotificationKind::Warning),
            category: Set(notification::NotificationCategory::MetricThreshold),
            title: Set("Cost per meal above target".to_string()),
            message: Set("Cost per meal rose 12% this month".to_string()),
            related_metric: Set(Some("costPerMeal".to_string())),
            priority: Set(notification::NotificationPriority::High),
            is_read: Set(false),
            is_dismissed: Set(false),
            created_at: Set(timestamp(4)),
            read_at: Set(None),
            expires_at: Set(Some(timestamp(4) + Duration::days(7))),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let fetched = Notification::find_by_id(inserted.id)
            .one(&db)
            .await?
            .expect("notification should exist");

        assert_eq!(fetched.kind, notification::NotificationKind::Warning);
        assert_eq!(
            fetched.category,
            notification::NotificationCategory::MetricThreshold
        );
        assert_eq!(fetched.priority, notification::NotificationPriority::High);
        assert_eq!(fetched.related_metric.as_deref(), Some("costPerMeal"));

        Ok(())
    }
}
