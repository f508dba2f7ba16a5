use serde::{Deserialize, Serialize};

/// fixVersions の要素
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
}
