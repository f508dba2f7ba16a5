use crate::client::IssueSource;
use crate::diagnostics::{ReportDiagnostics, Stage};
use crate::models::{EnrichedRecord, StoryRecord};

/// ストーリー → エピック → イニシアチブ の親リンクをたどる
///
/// どちらのパスも入力と同じ件数・順序で返す。取得や読み取りに失敗した
/// 項目は空文字になり、診断に記録される。
pub struct HierarchyEnricher<'a> {
    source: &'a dyn IssueSource,
    epic_link_field: String,
    initiative_link_field: String,
}

impl<'a> HierarchyEnricher<'a> {
    pub fn new(
        source: &'a dyn IssueSource,
        epic_link_field: impl Into<String>,
        initiative_link_field: impl Into<String>,
    ) -> Self {
        Self {
            source,
            epic_link_field: epic_link_field.into(),
            initiative_link_field: initiative_link_field.into(),
        }
    }

    /// ストーリーを取得し、fixVersion とエピックキーを付与する
    pub async fn attach_epic(
        &self,
        stories: Vec<StoryRecord>,
        diagnostics: &mut ReportDiagnostics,
    ) -> Vec<EnrichedRecord> {
        let mut records = Vec::with_capacity(stories.len());

        for story in stories {
            let mut record = EnrichedRecord::from(story);

            match self.source.fetch(&record.story_key).await {
                Ok(issue) => {
                    record.fix_version = issue.first_fix_version().unwrap_or_default().to_string();
                    match issue.linked_key(&self.epic_link_field) {
                        Ok(epic) => record.epic_key = epic.unwrap_or_default(),
                        Err(e) => diagnostics.record(Stage::Epic, Some(&record.story_key), &e),
                    }
                }
                Err(e) => diagnostics.record(Stage::Epic, Some(&record.story_key), &e),
            }

            records.push(record);
        }

        records
    }

    /// エピックを取得し、イニシアチブキーを付与する。エピックが無い行は取得しない
    pub async fn attach_initiative(
        &self,
        records: Vec<EnrichedRecord>,
        diagnostics: &mut ReportDiagnostics,
    ) -> Vec<EnrichedRecord> {
        let mut enriched = Vec::with_capacity(records.len());

        for mut record in records {
            record.initiative_key.clear();

            if !record.epic_key.is_empty() {
                match self.source.fetch(&record.epic_key).await {
                    Ok(epic) => match epic.linked_key(&self.initiative_link_field) {
                        Ok(initiative) => record.initiative_key = initiative.unwrap_or_default(),
                        Err(e) => diagnostics.record(Stage::Initiative, Some(&record.epic_key), &e),
                    },
                    Err(e) => diagnostics.record(Stage::Initiative, Some(&record.epic_key), &e),
                }
            }

            enriched.push(record);
        }

        enriched
    }

    /// 両方のパスを順に実行する
    pub async fn enrich(
        &self,
        stories: Vec<StoryRecord>,
        diagnostics: &mut ReportDiagnostics,
    ) -> Vec<EnrichedRecord> {
        let with_epics = self.attach_epic(stories, diagnostics).await;
        let enriched = self.attach_initiative(with_epics, diagnostics).await;
        tracing::info!(records = enriched.len(), "hierarchy enriched");
        enriched
    }
}
