/// エンドツーエンドテスト
///
/// モックJiraサーバーに対してレポート生成全体を実行します：
/// 1. 検索 → worklog集計 → ストーリー集約 → 親付与 → CSV
/// 2. 検索結果の全ページ取得
/// 3. 打ち切られたworklogの再取得
/// 4. 親Issueの取得回数
use jira_worklog_report::{
    Auth, CSV_HEADER, GroupingPolicy, JiraClient, JiraConfig, Paging, ReportConfig, ReportRequest,
    ReportService, WindowBounds,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(base_url: String) -> JiraClient {
    let config = JiraConfig::new(
        base_url,
        Auth::Basic {
            username: "report@example.com".to_string(),
            api_token: "token".to_string(),
        },
    )
    .unwrap();
    JiraClient::new(config).unwrap()
}

/// 埋め込みworklogを持つサブタスク
fn subtask(key: &str, parent: &str, worklogs: Vec<(&str, u64)>) -> Value {
    let total = worklogs.len();
    let entries: Vec<Value> = worklogs
        .into_iter()
        .map(|(started, seconds)| json!({ "started": started, "timeSpentSeconds": seconds }))
        .collect();

    json!({
        "id": "1",
        "key": key,
        "fields": {
            "issuetype": { "id": "5", "name": "Sub-task", "subtask": true },
            "parent": { "key": parent },
            "worklog": { "startAt": 0, "maxResults": 20, "total": total, "worklogs": entries }
        }
    })
}

fn search_page(issues: Vec<Value>, start_at: u32, total: usize) -> Value {
    json!({ "startAt": start_at, "maxResults": 50, "total": total, "issues": issues })
}

async fn mount_issue(server: &MockServer, key: &str, fields: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/api/2/issue/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "key": key,
            "fields": fields
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_report_end_to_end() {
    // Given: STORY-1 (EPIC-1 → INIT-1) と エピックの無い STORY-2
    let mock_server = MockServer::start().await;

    let issues = vec![
        subtask("SUB-1", "STORY-1", vec![("2024-01-10T09:00:00.000+0000", 3600)]),
        subtask(
            "SUB-2",
            "STORY-1",
            vec![
                ("2024-01-20T09:00:00.000+0000", 7200),
                // 期間外
                ("2024-02-05T09:00:00.000+0000", 999),
                // 終了日ちょうどは含まれない
                ("2024-01-31T09:00:00.000+0000", 500),
            ],
        ),
        subtask("SUB-3", "STORY-2", vec![("2024-01-15T09:00:00.000+0000", 1800)]),
    ];

    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .and(body_partial_json(json!({
            "jql": "issuetype=sub-task and sprint is not EMPTY and worklogDate >= 2024-01-01 and worklogDate <= 2024-01-31",
            "startAt": 0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(issues, 0, 3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_issue(
        &mock_server,
        "STORY-1",
        json!({ "fixVersions": [{ "id": "10", "name": "v1" }], "customfield_10001": "EPIC-1" }),
        1,
    )
    .await;
    mount_issue(&mock_server, "STORY-2", json!({ "fixVersions": [] }), 1).await;
    mount_issue(&mock_server, "EPIC-1", json!({ "customfield_10007": "INIT-1" }), 1).await;

    let client = create_client(mock_server.uri());
    let service = ReportService::new(&client, ReportConfig::default());

    // When
    let report = service
        .generate(&ReportRequest::new("2024-01-01", "2024-01-31"))
        .await;

    // Then
    assert_eq!(
        report.csv,
        "fixVersion,timeSpent,story,epic,initiative\n\
         v1,10800,STORY-1,EPIC-1,INIT-1\n\
         ,1800,STORY-2,,\n"
    );
    assert!(report.diagnostics.is_complete());
}

#[tokio::test]
async fn test_report_inclusive_bounds_counts_boundary_days() {
    let mock_server = MockServer::start().await;

    let issues = vec![subtask(
        "SUB-1",
        "STORY-1",
        vec![
            ("2024-01-01T09:00:00.000+0000", 100),
            ("2024-01-15T09:00:00.000+0000", 10),
            ("2024-01-31T23:59:00.000+0000", 1),
        ],
    )];

    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(issues, 0, 1)))
        .mount(&mock_server)
        .await;
    mount_issue(&mock_server, "STORY-1", json!({}), 2).await;

    let client = create_client(mock_server.uri());
    let request = ReportRequest::new("2024-01-01", "2024-01-31");

    let exclusive = ReportService::new(&client, ReportConfig::default())
        .generate(&request)
        .await;
    let inclusive = ReportService::new(
        &client,
        ReportConfig::new().window_bounds(WindowBounds::Inclusive),
    )
    .generate(&request)
    .await;

    assert_eq!(exclusive.records[0].time_spent_seconds, 10);
    assert_eq!(inclusive.records[0].time_spent_seconds, 111);
}

#[tokio::test]
async fn test_report_collects_every_search_page() {
    // Given: 3ページに分かれた120件のサブタスク（各60秒）
    let mock_server = MockServer::start().await;

    for (start_at, count) in [(0u32, 50usize), (50, 50), (100, 20)] {
        let issues = (0..count)
            .map(|i| {
                subtask(
                    &format!("SUB-{}", start_at as usize + i),
                    "STORY-1",
                    vec![("2024-03-10T10:00:00.000+0000", 60)],
                )
            })
            .collect();

        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({ "startAt": start_at, "maxResults": 50 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_page(issues, start_at, 120)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    mount_issue(&mock_server, "STORY-1", json!({ "fixVersions": [{ "name": "2.0" }] }), 1).await;

    let client = create_client(mock_server.uri());
    let service = ReportService::new(&client, ReportConfig::default());

    // When
    let report = service
        .generate(&ReportRequest::new("2024-03-01", "2024-03-31"))
        .await;

    // Then: 全120件が1行に集約される
    assert_eq!(report.csv, format!("{}\n2.0,7200,STORY-1,,\n", CSV_HEADER));
    assert!(report.diagnostics.is_complete());
}

#[tokio::test]
async fn test_report_refetches_truncated_worklog() {
    // Given: 埋め込みworklogが3件中1件だけのサブタスク
    let mock_server = MockServer::start().await;

    let issue = json!({
        "key": "SUB-1",
        "fields": {
            "parent": { "key": "STORY-1" },
            "worklog": {
                "startAt": 0, "maxResults": 1, "total": 3,
                "worklogs": [{ "started": "2024-01-10T09:00:00.000+0000", "timeSpentSeconds": 60 }]
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(vec![issue], 0, 1)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/SUB-1/worklog"))
        .and(query_param("startAt", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0, "maxResults": 1000, "total": 3,
            "worklogs": [
                { "started": "2024-01-10T09:00:00.000+0000", "timeSpentSeconds": 60 },
                { "started": "2024-01-11T09:00:00.000+0000", "timeSpentSeconds": 120 },
                { "started": "2024-01-12T09:00:00.000+0000", "timeSpentSeconds": 180 }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_issue(&mock_server, "STORY-1", json!({}), 1).await;

    let client = create_client(mock_server.uri());

    // When
    let report = ReportService::new(&client, ReportConfig::default())
        .generate(&ReportRequest::new("2024-01-01", "2024-01-31"))
        .await;

    // Then
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].time_spent_seconds, 360);
    assert!(report.diagnostics.is_complete());
}

#[tokio::test]
async fn test_adjacent_grouping_fetches_story_per_run() {
    // Given: A, B, A の順に並んだサブタスク
    let mock_server = MockServer::start().await;

    let issues = vec![
        subtask("SUB-1", "STORY-A", vec![("2024-01-10T09:00:00.000+0000", 10)]),
        subtask("SUB-2", "STORY-B", vec![("2024-01-10T09:00:00.000+0000", 5)]),
        subtask("SUB-3", "STORY-A", vec![("2024-01-10T09:00:00.000+0000", 3)]),
    ];

    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(issues, 0, 3)))
        .mount(&mock_server)
        .await;

    // 隣接集約ではSTORY-Aが2行になり、行ごとに取得される
    mount_issue(&mock_server, "STORY-A", json!({ "customfield_10001": "EPIC-1" }), 2).await;
    mount_issue(&mock_server, "STORY-B", json!({}), 1).await;
    mount_issue(&mock_server, "EPIC-1", json!({}), 2).await;

    let client = create_client(mock_server.uri());
    let config = ReportConfig::new()
        .grouping(GroupingPolicy::Adjacent)
        .paging(Paging::new(50, 10));

    let report = ReportService::new(&client, config)
        .generate(&ReportRequest::new("2024-01-01", "2024-01-31"))
        .await;

    let lines: Vec<&str> = report.csv.lines().collect();
    assert_eq!(
        lines,
        vec![CSV_HEADER, ",10,STORY-A,EPIC-1,", ",5,STORY-B,,", ",3,STORY-A,EPIC-1,"]
    );
}
