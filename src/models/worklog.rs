use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worklog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Jiraの日時文字列（例: `2024-01-15T09:00:00.000+0000`）
    pub started: String,
    #[serde(rename = "timeSpentSeconds")]
    pub time_spent_seconds: u64,
}

/// Issueに埋め込まれた、または worklog エンドポイントが返すworklogページ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorklogPage {
    #[serde(rename = "startAt")]
    #[serde(default)]
    pub start_at: u32,
    #[serde(rename = "maxResults")]
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

impl WorklogPage {
    /// 埋め込みページが全件を含んでいない場合 true
    pub fn is_truncated(&self) -> bool {
        (self.worklogs.len() as u32) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_worklog_page_truncation() {
        let page: WorklogPage = serde_json::from_value(json!({
            "startAt": 0,
            "maxResults": 20,
            "total": 25,
            "worklogs": [
                { "id": "100", "started": "2024-01-02T10:00:00.000+0000", "timeSpentSeconds": 1800 }
            ]
        }))
        .unwrap();

        assert!(page.is_truncated());
        assert_eq!(page.worklogs[0].time_spent_seconds, 1800);

        let complete = WorklogPage { total: 1, ..page };
        assert!(!complete.is_truncated());
    }
}
