use serde::{Deserialize, Serialize};

/// サブタスク1件分の期間内作業時間
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub subtask_key: String,
    /// 直近の親（ストーリー）
    pub story_key: String,
    pub time_spent_seconds: u64,
}

/// ストーリー単位に集約した作業時間
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub story_key: String,
    pub time_spent_seconds: u64,
}

/// エピック・イニシアチブを付与したレポート行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub story_key: String,
    pub time_spent_seconds: u64,
    pub fix_version: String,
    pub epic_key: String,
    pub initiative_key: String,
}

impl SubtaskRecord {
    pub fn new(subtask_key: impl Into<String>, story_key: impl Into<String>, time_spent_seconds: u64) -> Self {
        Self {
            subtask_key: subtask_key.into(),
            story_key: story_key.into(),
            time_spent_seconds,
        }
    }
}

impl StoryRecord {
    pub fn new(story_key: impl Into<String>, time_spent_seconds: u64) -> Self {
        Self {
            story_key: story_key.into(),
            time_spent_seconds,
        }
    }
}

impl From<StoryRecord> for EnrichedRecord {
    fn from(story: StoryRecord) -> Self {
        Self {
            story_key: story.story_key,
            time_spent_seconds: story.time_spent_seconds,
            fix_version: String::new(),
            epic_key: String::new(),
            initiative_key: String::new(),
        }
    }
}
