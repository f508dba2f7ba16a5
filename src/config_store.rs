use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::Error;
use crate::models::Paging;
use crate::rollup::GroupingPolicy;
use crate::time_filter::WindowBounds;

/// サブタスク検索のデフォルトJQL。`{start}` と `{end}` は期間で置換される
pub const DEFAULT_SUBTASK_JQL: &str =
    "issuetype=sub-task and sprint is not EMPTY and worklogDate >= {start} and worklogDate <= {end}";

/// レポート設定の保存・読み込み
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// レポート設定を保存
    async fn save_report_config(&mut self, config: &ReportConfig) -> Result<(), Error>;

    /// レポート設定を読み込み（未保存なら None）
    async fn load_report_config(&self) -> Result<Option<ReportConfig>, Error>;

    /// 設定ストアを初期化
    async fn initialize(&mut self) -> Result<(), Error>;

    /// 設定ストアをクリア
    async fn clear(&mut self) -> Result<(), Error>;
}

/// Jiraインスタンスごとに異なるカスタムフィールドID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertFieldMap {
    pub submit_date: String,
    pub summary: String,
    pub delivery_date: String,
    pub outcome: String,
    pub justification: String,
    pub revenue: String,
}

impl Default for UpsertFieldMap {
    fn default() -> Self {
        Self {
            submit_date: "customfield_11301".to_string(),
            summary: "customfield_11302".to_string(),
            delivery_date: "customfield_10600".to_string(),
            outcome: "customfield_11303".to_string(),
            justification: "customfield_11304".to_string(),
            revenue: "customfield_11307".to_string(),
        }
    }
}

/// レポート生成の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// ストーリーの親エピックを保持するカスタムフィールド
    pub epic_link_field: String,
    /// エピックの親イニシアチブを保持するカスタムフィールド
    pub initiative_link_field: String,
    /// サブタスク検索のJQLテンプレート
    pub subtask_jql: String,
    pub paging: Paging,
    pub grouping: GroupingPolicy,
    pub window_bounds: WindowBounds,
    pub upsert_fields: UpsertFieldMap,
    /// カスタムフィールドを送らないサンドボックス用プロジェクト
    pub sandbox_projects: Vec<String>,
}

impl ReportConfig {
    pub fn new() -> Self {
        Self {
            epic_link_field: "customfield_10001".to_string(),
            initiative_link_field: "customfield_10007".to_string(),
            subtask_jql: DEFAULT_SUBTASK_JQL.to_string(),
            paging: Paging::default(),
            grouping: GroupingPolicy::default(),
            window_bounds: WindowBounds::default(),
            upsert_fields: UpsertFieldMap::default(),
            sandbox_projects: vec!["TEST".to_string()],
        }
    }

    pub fn grouping(mut self, grouping: GroupingPolicy) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn window_bounds(mut self, bounds: WindowBounds) -> Self {
        self.window_bounds = bounds;
        self
    }

    pub fn paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    /// 設定値の妥当性チェック
    pub fn validate(&self) -> Result<(), Error> {
        if self.epic_link_field.trim().is_empty() || self.initiative_link_field.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "epic_link_field and initiative_link_field must be set".to_string(),
            ));
        }
        if self.paging.page_size == 0 || self.paging.max_pages == 0 {
            return Err(Error::InvalidConfiguration(
                "paging.page_size and paging.max_pages must be at least 1".to_string(),
            ));
        }
        if !self.subtask_jql.contains("{start}") || !self.subtask_jql.contains("{end}") {
            return Err(Error::InvalidConfiguration(
                "subtask_jql must contain {start} and {end}".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_sandbox_project(&self, project: &str) -> bool {
        self.sandbox_projects.iter().any(|p| p == project)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON形式のファイルベース設定ストア
pub struct FileConfigStore {
    /// 設定ディレクトリのパス
    config_dir: PathBuf,
}

impl FileConfigStore {
    /// 新しいファイル設定ストアを作成
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// デフォルトの設定ディレクトリでファイル設定ストアを作成
    pub fn default_config_dir() -> Result<Self, Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigurationMissing("設定ディレクトリが見つかりません".to_string()))?
            .join("jira-worklog-report");

        Ok(Self::new(config_dir))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn report_config_path(&self) -> PathBuf {
        self.config_dir.join("report_config.json")
    }

    /// JSONファイルに書き込み
    async fn write_json_file<T>(&self, path: &Path, data: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        // 親ディレクトリを作成
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json_data = serde_json::to_string_pretty(data)
            .map_err(|e| Error::SerializationError(format!("JSON serialization failed: {}", e)))?;

        let mut file = fs::File::create(path).await?;
        file.write_all(json_data.as_bytes()).await?;
        file.sync_all().await?;

        Ok(())
    }

    /// JSONファイルから読み込み
    async fn read_json_file<T>(&self, path: &Path) -> Result<Option<T>, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !path.exists() {
            return Ok(None);
        }

        let mut file = fs::File::open(path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&contents)
            .map_err(|e| Error::SerializationError(format!("JSON deserialization failed: {}", e)))?;

        Ok(Some(data))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn save_report_config(&mut self, config: &ReportConfig) -> Result<(), Error> {
        config.validate()?;
        let path = self.report_config_path();
        self.write_json_file(&path, config).await
    }

    async fn load_report_config(&self) -> Result<Option<ReportConfig>, Error> {
        let path = self.report_config_path();
        let config: Option<ReportConfig> = self.read_json_file(&path).await?;
        if let Some(config) = &config {
            config.validate()?;
        }
        Ok(config)
    }

    async fn initialize(&mut self) -> Result<(), Error> {
        fs::create_dir_all(&self.config_dir).await?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), Error> {
        if self.config_dir.exists() {
            fs::remove_dir_all(&self.config_dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileConfigStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(temp_dir.path().join("config"));
        (store, temp_dir)
    }

    #[test]
    fn test_report_config_defaults() {
        let config = ReportConfig::default();

        assert_eq!(config.epic_link_field, "customfield_10001");
        assert_eq!(config.initiative_link_field, "customfield_10007");
        assert_eq!(config.grouping, GroupingPolicy::ByStory);
        assert_eq!(config.window_bounds, WindowBounds::Exclusive);
        assert!(config.is_sandbox_project("TEST"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_config_validation() {
        let mut config = ReportConfig::new().paging(Paging::new(0, 10));
        assert!(config.validate().is_err());

        config = ReportConfig::new();
        config.subtask_jql = "issuetype=sub-task".to_string();
        assert!(config.validate().is_err());

        config = ReportConfig::new();
        config.epic_link_field = " ".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // 一部のキーだけ書かれたファイルでも読める
        let config: ReportConfig = serde_json::from_str(
            r#"{ "epic_link_field": "customfield_12345", "grouping": "adjacent" }"#,
        )
        .unwrap();

        assert_eq!(config.epic_link_field, "customfield_12345");
        assert_eq!(config.initiative_link_field, "customfield_10007");
        assert_eq!(config.grouping, GroupingPolicy::Adjacent);
        assert_eq!(config.paging, Paging::default());
    }

    #[tokio::test]
    async fn test_report_config_save_and_load() {
        let (mut store, _temp_dir) = create_test_store();
        store.initialize().await.unwrap();

        // 未保存
        assert!(store.load_report_config().await.unwrap().is_none());

        let config = ReportConfig::new()
            .grouping(GroupingPolicy::Adjacent)
            .window_bounds(WindowBounds::Inclusive)
            .paging(Paging::new(100, 20));

        // 保存
        store.save_report_config(&config).await.unwrap();

        // 読み込み
        let loaded = store.load_report_config().await.unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_invalid_config_is_not_saved() {
        let (mut store, _temp_dir) = create_test_store();
        let config = ReportConfig::new().paging(Paging::new(50, 0));

        let result = store.save_report_config(&config).await;

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        assert!(!store.config_dir().join("report_config.json").exists());
    }

    #[tokio::test]
    async fn test_config_store_clear() {
        let (mut store, _temp_dir) = create_test_store();
        store.save_report_config(&ReportConfig::default()).await.unwrap();
        assert!(store.config_dir().exists());

        store.clear().await.unwrap();

        assert!(!store.config_dir().exists());
        assert!(store.load_report_config().await.unwrap().is_none());
    }
}
