use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, FailureKind};

/// パイプラインの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Window,
    Search,
    Worklog,
    Epic,
    Initiative,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Window => "window",
            Stage::Search => "search",
            Stage::Worklog => "worklog",
            Stage::Epic => "epic",
            Stage::Initiative => "initiative",
        };
        f.write_str(name)
    }
}

/// 握りつぶされた1件の失敗
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: FailureKind,
    /// 対象のIssueキー（あれば）
    pub subject: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "[{}] {}: {}", self.stage, subject, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// レポート生成中の失敗を集める
///
/// 各段階は失敗してもデフォルト値で処理を続けるため、呼び出し側は
/// ここを見てレポートが不完全かどうかを判断する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDiagnostics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub entries: Vec<Diagnostic>,
}

impl ReportDiagnostics {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            entries: Vec::new(),
        }
    }

    /// 失敗を記録し、警告ログを出す
    pub fn record(&mut self, stage: Stage, subject: Option<&str>, error: &Error) {
        tracing::warn!(%stage, subject = subject.unwrap_or("-"), %error, "report step failed; using default");
        self.entries.push(Diagnostic {
            stage,
            kind: error.kind(),
            subject: subject.map(str::to_string),
            message: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.end_time = Utc::now();
    }

    /// 失敗が一件もなければ true
    pub fn is_complete(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_by_stage(&self, stage: Stage) -> usize {
        self.entries.iter().filter(|d| d.stage == stage).count()
    }

    pub fn count_by_kind(&self, kind: FailureKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// 処理時間（秒）
    pub fn duration_seconds(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ReportDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}
