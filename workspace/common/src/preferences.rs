use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationSettings {
    pub email: bool,
    pub in_app: bool,
    pub threshold_alerts: bool,
    pub daily_digest: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: false,
            in_app: true,
            threshold_alerts: true,
            daily_digest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplaySettings {
    pub theme: Theme,
    pub compact_mode: bool,
    pub show_sparklines: bool,
    pub default_time_range: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            compact_mode: false,
            show_sparklines: true,
            default_time_range: "30d".to_string(),
        }
    }
}

/// Per-user dashboard preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserPreferencesDto {
    pub user_id: UserId,
    pub pinned_metrics: Vec<String>,
    pub favorite_sections: Vec<String>,
    pub notification_settings: NotificationSettings,
    pub display_settings: DisplaySettings,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Partial update of preferences. Absent fields stay unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePreferencesRequest {
    pub pinned_metrics: Option<Vec<String>>,
    pub favorite_sections: Option<Vec<String>>,
    pub notification_settings: Option<NotificationSettings>,
    pub display_settings: Option<DisplaySettings>,
}

/// Sections favorited for a fresh user.
pub fn default_favorite_sections() -> Vec<String> {
    vec!["executive".to_string()]
}

/// Adds `item` when absent, removes it when present.
pub fn toggle_membership(items: &mut Vec<String>, item: &str) {
    if let Some(position) = items.iter().position(|i| i == item) {
        items.remove(position);
    } else {
        items.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_membership() {
        let mut items = default_favorite_sections();
        toggle_membership(&mut items, "financial");
        assert_eq!(items, vec!["executive", "financial"]);

        toggle_membership(&mut items, "executive");
        assert_eq!(items, vec!["financial"]);
    }

    #[test]
    fn test_default_settings() {
        let notifications = NotificationSettings::default();
        assert!(notifications.in_app && notifications.threshold_alerts);
        assert!(!notifications.email && !notifications.daily_digest);

        let display = DisplaySettings::default();
        assert_eq!(display.theme, Theme::Dark);
        assert_eq!(display.default_time_range, "30d");
    }
}
