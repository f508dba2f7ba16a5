use std::borrow::Cow;

use crate::client::IssueSource;
use crate::diagnostics::{ReportDiagnostics, Stage};
use crate::error::Error;
use crate::models::{Issue, SubtaskRecord, Worklog};
use crate::time_filter::{ReportWindow, WindowBounds, parse_worklog_date};

/// サブタスクごとに期間内のworklogを合計する
pub struct WorklogAggregator<'a> {
    source: &'a dyn IssueSource,
    bounds: WindowBounds,
}

impl<'a> WorklogAggregator<'a> {
    pub fn new(source: &'a dyn IssueSource) -> Self {
        Self {
            source,
            bounds: WindowBounds::default(),
        }
    }

    pub fn bounds(mut self, bounds: WindowBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// `yyyy-mm-dd` 形式の期間で集計する
    ///
    /// 期間の解析に失敗した場合はどのIssueも集計せず、診断に1件記録する。
    pub async fn aggregate(
        &self,
        issues: &[Issue],
        window_start: &str,
        window_end: &str,
        diagnostics: &mut ReportDiagnostics,
    ) -> Vec<SubtaskRecord> {
        match ReportWindow::parse(window_start, window_end) {
            Ok(window) => {
                self.aggregate_window(issues, &window.bounds(self.bounds), diagnostics)
                    .await
            }
            Err(e) => {
                diagnostics.record(Stage::Window, None, &e);
                Vec::new()
            }
        }
    }

    /// 入力順を保ったまま、親を持つIssue1件につき1レコードを返す
    pub async fn aggregate_window(
        &self,
        issues: &[Issue],
        window: &ReportWindow,
        diagnostics: &mut ReportDiagnostics,
    ) -> Vec<SubtaskRecord> {
        let mut records = Vec::with_capacity(issues.len());

        for issue in issues {
            let Some(story_key) = issue.parent_key() else {
                let e = Error::MissingField {
                    issue_key: issue.key.clone(),
                    field: "parent".to_string(),
                };
                diagnostics.record(Stage::Worklog, Some(&issue.key), &e);
                continue;
            };

            let worklogs = self.worklogs_for(issue, diagnostics).await;
            let seconds = sum_in_window(&issue.key, &worklogs, window, diagnostics);

            records.push(SubtaskRecord::new(issue.key.clone(), story_key, seconds));
        }

        tracing::info!(issues = issues.len(), records = records.len(), "worklogs aggregated");
        records
    }

    async fn worklogs_for<'i>(
        &self,
        issue: &'i Issue,
        diagnostics: &mut ReportDiagnostics,
    ) -> Cow<'i, [Worklog]> {
        let embedded = issue.fields.worklog.as_ref();
        if let Some(page) = embedded {
            if !page.is_truncated() {
                return Cow::Borrowed(page.worklogs.as_slice());
            }
        }

        tracing::debug!(issue = %issue.key, "embedded worklog incomplete; fetching full list");
        match self.source.fetch_worklogs(&issue.key).await {
            Ok(all) => Cow::Owned(all),
            Err(e) => {
                diagnostics.record(Stage::Worklog, Some(&issue.key), &e);
                embedded
                    .map(|page| Cow::Borrowed(page.worklogs.as_slice()))
                    .unwrap_or_default()
            }
        }
    }
}

/// 期間内のworklogの秒数を合計する。日付が読めないworklogは除外して記録する
pub fn sum_in_window(
    issue_key: &str,
    worklogs: &[Worklog],
    window: &ReportWindow,
    diagnostics: &mut ReportDiagnostics,
) -> u64 {
    let mut seconds = 0u64;
    for worklog in worklogs {
        match parse_worklog_date(&worklog.started) {
            Ok(date) if window.contains(date) => seconds += worklog.time_spent_seconds,
            Ok(_) => {}
            Err(e) => diagnostics.record(Stage::Worklog, Some(issue_key), &e),
        }
    }
    seconds
}
