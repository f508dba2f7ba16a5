use serde_json::{Map, Value, json};

use crate::client::JiraClient;
use crate::config_store::ReportConfig;
use crate::error::{Error, Result};
use crate::models::IssueUpsertRequest;

/// Builds the `{ "fields": { ... } }` payload for issue create/update.
///
/// Custom fields are mapped through `ReportConfig::upsert_fields` and left out
/// for sandbox projects, which usually lack them.
pub fn build_payload(request: &IssueUpsertRequest, config: &ReportConfig) -> Result<Value> {
    if request.project.trim().is_empty() {
        return Err(Error::InvalidInput("project is required".to_string()));
    }
    if request.issue_type.trim().is_empty() {
        return Err(Error::InvalidInput("issueType is required".to_string()));
    }

    let mut fields = Map::new();
    fields.insert("project".to_string(), json!({ "key": request.project }));
    fields.insert("summary".to_string(), json!(request.title));
    fields.insert("description".to_string(), json!(request.title));
    fields.insert("issuetype".to_string(), json!({ "name": request.issue_type }));

    if !config.is_sandbox_project(&request.project) {
        let map = &config.upsert_fields;
        for (field_id, value) in [
            (&map.submit_date, &request.submit_date),
            (&map.summary, &request.summary),
            (&map.delivery_date, &request.delivery_date),
            (&map.outcome, &request.outcome),
            (&map.justification, &request.justification),
            (&map.revenue, &request.revenue),
        ] {
            fields.insert(field_id.clone(), json!(value));
        }
    }

    Ok(json!({ "fields": fields }))
}

/// Issueを作成または更新し、そのキーを返す
pub async fn upsert_issue(
    client: &JiraClient,
    request: &IssueUpsertRequest,
    config: &ReportConfig,
) -> Result<String> {
    let payload = build_payload(request, config)?;

    match request.target_key() {
        Some(key) => {
            tracing::info!(issue = key, "updating issue");
            client.update_issue(key, &payload).await?;
            Ok(key.to_string())
        }
        None => {
            tracing::info!(project = %request.project, "creating issue");
            let created = client.create_issue(&payload).await?;
            Ok(created.key)
        }
    }
}
