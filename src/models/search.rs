use super::Issue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchParams {
    #[serde(rename = "startAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u32>,

    #[serde(rename = "maxResults")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "startAt")]
    #[serde(default)]
    pub start_at: u32,

    #[serde(rename = "maxResults")]
    pub max_results: u32,

    pub total: u32,

    pub issues: Vec<Issue>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(mut self, start_at: u32) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// 検索のページング設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// 1リクエストあたりの取得件数
    pub page_size: u32,
    /// サーバーが total を誤報告した場合の無限ループ防止用上限
    pub max_pages: u32,
}

impl Paging {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self { page_size, max_pages }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 200,
        }
    }
}
