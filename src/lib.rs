pub mod aggregator;
pub mod client;
pub mod config_store;
pub mod diagnostics;
pub mod enrich;
pub mod error;
pub mod models;
pub mod report;
pub mod rollup;
pub mod time_filter;
pub mod upsert;

pub use client::{Auth, IssueSource, JiraClient, JiraConfig};
pub use error::{Error, FailureKind};
pub use models::*;

// Pipeline re-exports
pub use aggregator::WorklogAggregator;
pub use enrich::HierarchyEnricher;
pub use report::{CSV_HEADER, Report, ReportFormatter, ReportRequest, ReportService};
pub use rollup::{GroupingPolicy, HierarchyRoller};

// Time filter re-exports
pub use time_filter::{ReportWindow, WindowBounds, parse_report_date, parse_worklog_date};

// Diagnostics re-exports
pub use diagnostics::{Diagnostic, ReportDiagnostics, Stage};

// Config store re-exports
pub use config_store::{ConfigStore, FileConfigStore, ReportConfig, UpsertFieldMap};

pub use upsert::{build_payload, upsert_issue};
