use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{StoryRecord, SubtaskRecord};

/// サブタスクをストーリーにまとめる方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// 直前のグループと同じストーリーの場合だけ合算する（旧レポート互換）
    Adjacent,
    /// ストーリーキーごとに合算し、初出順で出力する
    #[default]
    ByStory,
}

/// SubtaskRecord を StoryRecord に集約する
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyRoller {
    policy: GroupingPolicy,
}

impl HierarchyRoller {
    pub fn new(policy: GroupingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> GroupingPolicy {
        self.policy
    }

    pub fn roll(&self, records: &[SubtaskRecord]) -> Vec<StoryRecord> {
        let stories = match self.policy {
            GroupingPolicy::Adjacent => roll_adjacent(records),
            GroupingPolicy::ByStory => roll_by_story(records),
        };
        tracing::info!(
            policy = ?self.policy,
            subtasks = records.len(),
            stories = stories.len(),
            "subtasks rolled up"
        );
        stories
    }
}

/// Merges a record into the previous group only when the story keys match.
/// A key seen earlier but separated by another story starts a new group.
fn roll_adjacent(records: &[SubtaskRecord]) -> Vec<StoryRecord> {
    let mut stories: Vec<StoryRecord> = Vec::new();
    for record in records {
        match stories.last_mut() {
            Some(current) if current.story_key == record.story_key => {
                current.time_spent_seconds += record.time_spent_seconds;
            }
            _ => stories.push(StoryRecord::new(record.story_key.clone(), record.time_spent_seconds)),
        }
    }
    stories
}

fn roll_by_story(records: &[SubtaskRecord]) -> Vec<StoryRecord> {
    let mut stories: Vec<StoryRecord> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.story_key.as_str()) {
            Some(&i) => stories[i].time_spent_seconds += record.time_spent_seconds,
            None => {
                index.insert(record.story_key.as_str(), stories.len());
                stories.push(StoryRecord::new(record.story_key.clone(), record.time_spent_seconds));
            }
        }
    }
    stories
}
