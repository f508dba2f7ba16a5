use serde::{Deserialize, Serialize};

/// Issue作成・更新リクエスト
///
/// `issue_key` が空または未指定なら作成、それ以外は更新。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpsertRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
    pub project: String,
    pub issue_type: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub submit_date: String,
    #[serde(default)]
    pub delivery_date: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub revenue: String,
}

impl IssueUpsertRequest {
    /// 更新対象のキー（空文字は作成扱い）
    pub fn target_key(&self) -> Option<&str> {
        self.issue_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// `POST /issue` のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}
