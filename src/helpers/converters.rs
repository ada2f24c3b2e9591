use common::notifications::{
    NotificationCategory, NotificationDto, NotificationKind, NotificationPriority,
};
use common::preferences::UserPreferencesDto;
use common::saved_scenario::SavedScenarioDto;
use common::UserId;
use model::entities::{notification, saved_scenario, user_preference};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serializes a value for one of the JSON text columns.
pub fn to_json_column<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Error encoding JSON column: {}", e))
}

fn from_json_column<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|e| format!("Error decoding {} column: {}", column, e))
}

fn stored_user_id(raw: String) -> Result<UserId, String> {
    UserId::try_from(raw).map_err(|e| format!("Stored user id is invalid: {}", e))
}

/// Helper function to convert a saved scenario row into its API form
pub fn saved_scenario_to_dto(model: saved_scenario::Model) -> Result<SavedScenarioDto, String> {
    let results = model
        .results
        .as_deref()
        .map(|raw| from_json_column("results", raw))
        .transpose()?;

    Ok(SavedScenarioDto {
        id: model.id,
        user_id: stored_user_id(model.user_id)?,
        name: model.name,
        description: model.description,
        scenario_data: from_json_column("scenario_data", &model.scenario_data)?,
        results,
        tags: from_json_column("tags", &model.tags)?,
        is_favorite: model.is_favorite,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_viewed_at: model.last_viewed_at,
    })
}

/// Helper function to convert a preferences row into its API form
pub fn preferences_to_dto(model: user_preference::Model) -> Result<UserPreferencesDto, String> {
    Ok(UserPreferencesDto {
        user_id: stored_user_id(model.user_id)?,
        pinned_metrics: from_json_column("pinned_metrics", &model.pinned_metrics)?,
        favorite_sections: from_json_column("favorite_sections", &model.favorite_sections)?,
        notification_settings: from_json_column(
            "notification_settings",
            &model.notification_settings,
        )?,
        display_settings: from_json_column("display_settings", &model.display_settings)?,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Helper function to convert a notification row into its API form
pub fn notification_to_dto(model: notification::Model) -> Result<NotificationDto, String> {
    Ok(NotificationDto {
        id: model.id,
        user_id: stored_user_id(model.user_id)?,
        kind: kind_to_dto(model.kind),
        category: category_to_dto(model.category),
        title: model.title,
        message: model.message,
        related_metric: model.related_metric,
        priority: priority_to_dto(model.priority),
        is_read: model.is_read,
        is_dismissed: model.is_dismissed,
        created_at: model.created_at,
        read_at: model.read_at,
        expires_at: model.expires_at,
    })
}

pub fn kind_to_dto(kind: notification::NotificationKind) -> NotificationKind {
    match kind {
        notification::NotificationKind::Alert => NotificationKind::Alert,
        notification::NotificationKind::Info => NotificationKind::Info,
        notification::NotificationKind::Warning => NotificationKind::Warning,
        notification::NotificationKind::Success => NotificationKind::Success,
    }
}

pub fn kind_to_entity(kind: NotificationKind) -> notification::NotificationKind {
    match kind {
        NotificationKind::Alert => notification::NotificationKind::Alert,
        NotificationKind::Info => notification::NotificationKind::Info,
        NotificationKind::Warning => notification::NotificationKind::Warning,
        NotificationKind::Success => notification::NotificationKind::Success,
    }
}

pub fn category_to_dto(category: notification::NotificationCategory) -> NotificationCategory {
    match category {
        notification::NotificationCategory::MetricThreshold => NotificationCategory::MetricThreshold,
        notification::NotificationCategory::System => NotificationCategory::System,
        notification::NotificationCategory::Insight => NotificationCategory::Insight,
        notification::NotificationCategory::Report => NotificationCategory::Report,
    }
}

pub fn category_to_entity(category: NotificationCategory) -> notification::NotificationCategory {
    match category {
        NotificationCategory::MetricThreshold => notification::NotificationCategory::MetricThreshold,
        NotificationCategory::System => notification::NotificationCategory::System,
        NotificationCategory::Insight => notification::NotificationCategory::Insight,
        NotificationCategory::Report => notification::NotificationCategory::Report,
    }
}

pub fn priority_to_dto(priority: notification::NotificationPriority) -> NotificationPriority {
    match priority {
        notification::NotificationPriority::Low => NotificationPriority::Low,
        notification::NotificationPriority::Medium => NotificationPriority::Medium,
        notification::NotificationPriority::High => NotificationPriority::High,
        notification::NotificationPriority::Critical => NotificationPriority::Critical,
    }
}

pub fn priority_to_entity(priority: NotificationPriority) -> notification::NotificationPriority {
    match priority {
        NotificationPriority::Low => notification::NotificationPriority::Low,
        NotificationPriority::Medium => notification::NotificationPriority::Medium,
        NotificationPriority::High => notification::NotificationPriority::High,
        NotificationPriority::Critical => notification::NotificationPriority::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::{Factor, ScenarioFactors};

    fn timestamp() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_saved_scenario_columns_decode() {
        let factors = ScenarioFactors::default().with(Factor::InflationRate, 12.5);
        let model = saved_scenario::Model {
            id: 4,
            user_id: "user_1_abc".to_string(),
            name: "High inflation".to_string(),
            description: None,
            scenario_data: to_json_column(&factors).unwrap(),
            results: None,
            tags: r#"["stress","q3"]"#.to_string(),
            is_favorite: true,
            created_at: timestamp(),
            updated_at: timestamp(),
            last_viewed_at: None,
        };

        let dto = saved_scenario_to_dto(model).unwrap();

        assert_eq!(dto.user_id.as_str(), "user_1_abc");
        assert_eq!(dto.scenario_data.get(Factor::InflationRate), 12.5);
        assert_eq!(dto.tags, vec!["stress", "q3"]);
        assert!(dto.results.is_none());
    }

    #[test]
    fn test_corrupt_json_column_is_reported() {
        let model = saved_scenario::Model {
            id: 1,
            user_id: "user_1_abc".to_string(),
            name: "Broken".to_string(),
            description: None,
            scenario_data: "{not json".to_string(),
            results: None,
            tags: "[]".to_string(),
            is_favorite: false,
            created_at: timestamp(),
            updated_at: timestamp(),
            last_viewed_at: None,
        };

        let error = saved_scenario_to_dto(model).unwrap_err();
        assert!(error.contains("scenario_data"));
    }

    #[test]
    fn test_notification_enums_map_both_ways() {
        for priority in [
            NotificationPriority::Low,
            NotificationPriority::Medium,
            NotificationPriority::High,
            NotificationPriority::Critical,
        ] {
            assert_eq!(priority_to_dto(priority_to_entity(priority)), priority);
        }
        assert_eq!(
            category_to_dto(category_to_entity(NotificationCategory::MetricThreshold)),
            NotificationCategory::MetricThreshold
        );
        assert_eq!(kind_to_dto(kind_to_entity(NotificationKind::Warning)), NotificationKind::Warning);
    }
}
