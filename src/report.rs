use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::Instrument;

use crate::aggregator::WorklogAggregator;
use crate::client::IssueSource;
use crate::config_store::ReportConfig;
use crate::diagnostics::{ReportDiagnostics, Stage};
use crate::enrich::HierarchyEnricher;
use crate::error::Error;
use crate::models::EnrichedRecord;
use crate::rollup::HierarchyRoller;
use crate::time_filter::ReportWindow;

pub const CSV_HEADER: &str = "fixVersion,timeSpent,story,epic,initiative";

/// `{"startDate": "yyyy-mm-dd", "endDate": "yyyy-mm-dd"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub start_date: String,
    pub end_date: String,
}

impl ReportRequest {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

/// 生成結果。CSVが空でも `diagnostics` を見れば失敗の有無がわかる
#[derive(Debug, Clone)]
pub struct Report {
    pub csv: String,
    pub records: Vec<EnrichedRecord>,
    pub diagnostics: ReportDiagnostics,
}

pub struct ReportFormatter;

impl ReportFormatter {
    /// Serializes records as `fixVersion,timeSpent,story,epic,initiative`.
    ///
    /// Values are written as-is without quoting; tracker keys and version
    /// names containing commas will shift columns.
    pub fn format(records: &[EnrichedRecord]) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 48);
        out.push_str(CSV_HEADER);
        out.push('\n');

        for record in records {
            // String への書き込みは失敗しない
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                record.fix_version,
                record.time_spent_seconds,
                record.story_key,
                record.epic_key,
                record.initiative_key
            );
        }
        out
    }
}

/// 検索 → worklog集計 → ストーリー集約 → 親付与 → CSV を順に実行する
pub struct ReportService<'a> {
    source: &'a dyn IssueSource,
    config: ReportConfig,
}

impl<'a> ReportService<'a> {
    pub fn new(source: &'a dyn IssueSource, config: ReportConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// レポートを生成する。失敗は `Report::diagnostics` に集められ、エラーにはならない
    pub async fn generate(&self, request: &ReportRequest) -> Report {
        let span = tracing::info_span!(
            "report",
            start = %request.start_date,
            end = %request.end_date
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ReportRequest) -> Report {
        let mut diagnostics = ReportDiagnostics::new();

        let window = match ReportWindow::parse(&request.start_date, &request.end_date) {
            Ok(window) => window.bounds(self.config.window_bounds),
            Err(e) => {
                diagnostics.record(Stage::Window, None, &e);
                return Self::finish(Vec::new(), diagnostics);
            }
        };
        if let Err(message) = window.is_valid() {
            diagnostics.record(Stage::Window, None, &Error::InvalidInput(message));
            return Self::finish(Vec::new(), diagnostics);
        }

        let jql = window.fill_jql(&self.config.subtask_jql);
        let issues = match self.source.search(&jql, &self.config.paging).await {
            Ok(issues) => issues,
            Err(e) => {
                diagnostics.record(Stage::Search, None, &e);
                Vec::new()
            }
        };

        let subtasks = WorklogAggregator::new(self.source)
            .bounds(self.config.window_bounds)
            .aggregate_window(&issues, &window, &mut diagnostics)
            .await;

        let stories = HierarchyRoller::new(self.config.grouping).roll(&subtasks);

        let records = HierarchyEnricher::new(
            self.source,
            &self.config.epic_link_field,
            &self.config.initiative_link_field,
        )
        .enrich(stories, &mut diagnostics)
        .await;

        Self::finish(records, diagnostics)
    }

    fn finish(records: Vec<EnrichedRecord>, mut diagnostics: ReportDiagnostics) -> Report {
        diagnostics.finish();
        if diagnostics.is_complete() {
            tracing::info!(rows = records.len(), "report generated");
        } else {
            tracing::warn!(
                rows = records.len(),
                failures = diagnostics.error_count(),
                "report generated with failures"
            );
        }

        Report {
            csv: ReportFormatter::format(&records),
            records,
            diagnostics,
        }
    }
}
