//! Domain and transport types shared by the compute crate, the persistence
//! layer and the HTTP API.

pub mod donations;
pub mod format;
pub mod notifications;
pub mod preferences;
pub mod saved_scenario;
pub mod scenario;
pub mod user;

pub use donations::{
    DataOrigin, DonationRecord, DonationStatus, DonationSummary, DonationSummaryResponse,
    MonthlyAggregate, MonthlyDonationsResponse,
};
pub use format::{MetricFormat, MetricKind, format_change, format_metric};
pub use scenario::{
    BaselineMetrics, CalculateScenarioRequest, CalculatedMetrics, Factor, ProgramEfficiencyScale,
    ScenarioFactors,
};
pub use user::{ParseUserIdError, UserId};
