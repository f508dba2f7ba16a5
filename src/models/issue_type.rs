use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueType {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask: Option<bool>,
}

impl IssueType {
    pub fn is_subtask(&self) -> bool {
        self.subtask.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_type_deserialization() {
        let json_data = json!({
            "id": "5",
            "name": "Sub-task",
            "self": "https://example.atlassian.net/rest/api/2/issuetype/5",
            "subtask": true
        });

        let issue_type: IssueType = serde_json::from_value(json_data).unwrap();

        assert_eq!(issue_type.id, "5");
        assert_eq!(issue_type.name, "Sub-task");
        assert!(issue_type.is_subtask());
    }
}
