//! Tests for the Greenhouse board tools against a local mock server

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use scout_agent::tools::{
    AtsMonitorTool, DetectAtsChangesTool, GreenhouseBoard, GreenhouseClient,
};
use scout_agent::ToolRegistry;
use scout_store::{JsonListingStore, ListingStore, NewListing};

fn board_body(company: &str) -> String {
    json!({
        "jobs": [
            {
                "id": 11,
                "title": "Software Engineer Intern",
                "location": { "name": "Remote" },
                "absolute_url": format!("https://boards.example/{}/jobs/11", company),
                "departments": [{ "name": "Engineering" }]
            },
            {
                "id": 12,
                "title": "Principal Engineer",
                "location": { "name": "Remote" },
                "absolute_url": format!("https://boards.example/{}/jobs/12", company)
            }
        ]
    })
    .to_string()
}

async fn mock_board(server: &mut ServerGuard, company: &str, status: usize) -> mockito::Mock {
    server
        .mock("GET", format!("/{}/jobs", company).as_str())
        .match_query(Matcher::UrlEncoded("format".into(), "json".into()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(board_body(company))
        .create_async()
        .await
}

fn client(server: &ServerGuard, companies: &[&str]) -> Arc<GreenhouseClient> {
    let boards = companies
        .iter()
        .map(|c| GreenhouseBoard::new(*c, format!("{}/{}", server.url(), c)))
        .collect();
    Arc::new(GreenhouseClient::new(boards).with_delay(Duration::ZERO))
}

#[tokio::test]
async fn test_monitor_ats_collects_internships() {
    let mut server = Server::new_async().await;
    let stripe = mock_board(&mut server, "stripe", 200).await;
    let notion = mock_board(&mut server, "notion", 200).await;

    let mut registry = ToolRegistry::new();
    registry
        .register(AtsMonitorTool::new(client(&server, &["stripe", "notion"])))
        .unwrap();

    let data = registry
        .dispatch("monitor_ats", json!({}))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    stripe.assert_async().await;
    notion.assert_async().await;
    assert_eq!(data["jobs_found"], json!(2));
    assert_eq!(data["companies_checked"], json!(["stripe", "notion"]));
    assert_eq!(data["jobs"][0]["company"], json!("stripe"));
    assert_eq!(data["jobs"][0]["department"], json!("Engineering"));
    assert_eq!(data["jobs"][0]["ats_id"], json!("11"));
}

#[tokio::test]
async fn test_monitor_ats_filters_companies_case_insensitively() {
    let mut server = Server::new_async().await;
    let stripe = mock_board(&mut server, "stripe", 200).await;

    let mut registry = ToolRegistry::new();
    registry
        .register(AtsMonitorTool::new(client(&server, &["stripe", "notion"])))
        .unwrap();

    let data = registry
        .dispatch(
            "monitor_ats",
            json!({ "companies": ["Stripe"], "check_internships_only": false }),
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    stripe.assert_async().await;
    assert_eq!(data["companies_checked"], json!(["stripe"]));
    assert_eq!(data["jobs_found"], json!(2));
    assert_eq!(data["errors"], json!({}));
}

#[tokio::test]
async fn test_monitor_ats_skips_failing_board() {
    let mut server = Server::new_async().await;
    let _up = mock_board(&mut server, "stripe", 200).await;
    let _down = mock_board(&mut server, "reddit", 503).await;

    let mut registry = ToolRegistry::new();
    registry
        .register(AtsMonitorTool::new(client(&server, &["stripe", "reddit"])))
        .unwrap();

    let data = registry
        .dispatch("monitor_ats", json!({ "ats_type": "lever" }))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(data["jobs_found"], json!(1));
    assert!(data["errors"]["reddit"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_detect_ats_changes_by_url() {
    let mut server = Server::new_async().await;
    let _stripe = mock_board(&mut server, "stripe", 200).await;
    let _notion = mock_board(&mut server, "notion", 200).await;

    let store = Arc::new(JsonListingStore::in_memory());
    store
        .save_batch(
            "earlier",
            vec![NewListing {
                title: Some("Renamed Intern Role".to_string()),
                company: Some("stripe".to_string()),
                url: Some("https://boards.example/stripe/jobs/11".to_string()),
                ..Default::default()
            }],
        )
        .await
        .unwrap();

    let mut registry = ToolRegistry::new();
    registry
        .register(DetectAtsChangesTool::new(
            client(&server, &["stripe", "notion"]),
            store,
        ))
        .unwrap();

    let data = registry
        .dispatch("detect_ats_changes", json!({}))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(data["total_jobs_found"], json!(2));
    assert_eq!(data["new_jobs"], json!(1));
    assert_eq!(data["alert_needed"], json!(true));
    assert_eq!(data["new_postings"][0]["company"], json!("notion"));
}
