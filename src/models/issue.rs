use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{IssueType, Version, WorklogPage};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "issuetype")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worklog: Option<WorklogPage>,
    #[serde(rename = "fixVersions")]
    #[serde(default)]
    pub fix_versions: Vec<Version>,

    // カスタムフィールドは動的に追加
    #[serde(flatten)]
    pub custom_fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentLink {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
}

impl Issue {
    /// 直近の親Issueのキー
    pub fn parent_key(&self) -> Option<&str> {
        self.fields.parent.as_ref().map(|p| p.key.as_str())
    }

    /// 最初のfixVersion名。複数あっても先頭のみ使用する
    pub fn first_fix_version(&self) -> Option<&str> {
        self.fields.fix_versions.first().map(|v| v.name.as_str())
    }

    /// Reads an issue key out of a link-type custom field.
    ///
    /// Returns `Ok(None)` when the field is absent or null. Epic links are
    /// plain strings, parent links are objects carrying `key` or `data.key`.
    pub fn linked_key(&self, field_id: &str) -> crate::error::Result<Option<String>> {
        let value = match self.fields.custom_fields.get(field_id) {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let key = match value {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map
                .get("key")
                .and_then(|k| k.as_str())
                .or_else(|| map.get("data").and_then(|d| d.get("key")).and_then(|k| k.as_str())),
            _ => None,
        };

        match key {
            Some(k) if k.trim().is_empty() => Ok(None),
            Some(k) => Ok(Some(k.to_string())),
            None => Err(crate::error::Error::MissingField {
                issue_key: self.key.clone(),
                field: field_id.to_string(),
            }),
        }
    }
}
