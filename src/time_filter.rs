use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// レポート期間の日付形式
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// 期間境界の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowBounds {
    /// 開始日・終了日ちょうどの作業記録は含めない（既存レポートと同じ挙動）
    #[default]
    Exclusive,
    /// 開始日・終了日ちょうどの作業記録も含める
    Inclusive,
}

/// worklogを集計する日付範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bounds: WindowBounds,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            bounds: WindowBounds::default(),
        }
    }

    /// `yyyy-mm-dd` 形式の文字列から期間を作成
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_report_date(start)?, parse_report_date(end)?))
    }

    pub fn bounds(mut self, bounds: WindowBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// 日付が期間内かどうか
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.bounds {
            WindowBounds::Exclusive => date > self.start && date < self.end,
            WindowBounds::Inclusive => date >= self.start && date <= self.end,
        }
    }

    /// 開始日が終了日より後でないことを確認
    pub fn is_valid(&self) -> std::result::Result<(), String> {
        if self.start > self.end {
            return Err(format!(
                "開始日 {} が終了日 {} より後に設定されています",
                self.start, self.end
            ));
        }
        Ok(())
    }

    /// JQLテンプレートの `{start}` / `{end}` を置換する
    pub fn fill_jql(&self, template: &str) -> String {
        template
            .replace("{start}", &self.start.format(REPORT_DATE_FORMAT).to_string())
            .replace("{end}", &self.end.format(REPORT_DATE_FORMAT).to_string())
    }
}

/// Parses a `yyyy-mm-dd` date. Anything other than exactly ten
/// zero-padded characters is rejected.
pub fn parse_report_date(value: &str) -> Result<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shape_ok {
        return Err(Error::InvalidDate(format!("expected yyyy-mm-dd, got '{}'", value)));
    }

    NaiveDate::parse_from_str(value, REPORT_DATE_FORMAT)
        .map_err(|e| Error::InvalidDate(format!("'{}': {}", value, e)))
}

/// Jiraの worklog `started`（例: `2024-01-15T09:00:00.000+0000`）から日付部分のみ取り出す
///
/// 時刻とタイムゾーンは捨てる。
pub fn parse_worklog_date(started: &str) -> Result<NaiveDate> {
    let date_part = started
        .get(..10)
        .ok_or_else(|| Error::InvalidDate(format!("worklog start too short: '{}'", started)))?;
    parse_report_date(date_part)
}
