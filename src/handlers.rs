pub mod donations;
pub mod health;
pub mod identity;
pub mod notifications;
pub mod preferences;
pub mod saved_scenarios;
pub mod scenarios;
