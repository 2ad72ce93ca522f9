// Subscription Revenue Forecast - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod parser;
pub mod ledger;
pub mod store;
pub mod classifier;     // Cadence + duration per subscription
pub mod revenue;        // Yearly buckets and deltas
pub mod ranking;        // Top-K growth / loss years
pub mod forecast;       // Next-year returning + new revenue
pub mod quality;        // Non-blocking ledger checks
pub mod report;
pub mod render;

// Re-export commonly used types
pub use error::{AnalysisError, ErrorScope, ItemError, Result};
pub use config::{AnalysisConfig, YearRange};
pub use parser::{parse_record, CsvRecordParser, RawRecord, RecordParser};
pub use ledger::{load_ledger, read_ledger, Ledger, Transaction};
pub use store::{RecordStore, Subscription, SubscriptionId};
pub use classifier::{classify, classify_all, CadenceType, Classification, ClassificationReport};
pub use revenue::{YearDelta, YearTotal, YearlyRevenue};
pub use ranking::{top_growth, top_loss, RankDirection};
pub use forecast::{forecast_all, forecast_cadence, CadenceForecast, Forecast, ForecastState};
pub use quality::{check_store, QualityIssue, QualityReport, Severity};
pub use report::{analyze, AnalysisReport, SubscriptionSummary};
pub use render::{format_currency, render_text};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
