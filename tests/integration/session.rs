//! Session tools against a live org.

use super::common::{call, live_context};
use serde_json::json;

#[tokio::test]
#[ignore]
async fn test_auth_status_reports_org() {
    let ctx = live_context().await;

    let status = call(&ctx, "salesforce_auth_status", json!({})).await;
    assert_eq!(status["authenticated"], true, "{status}");
    assert!(status["instance_url"]
        .as_str()
        .is_some_and(|url| url.starts_with("https://")));
    assert_eq!(status["can_refresh"], true);
}

#[tokio::test]
#[ignore]
async fn test_logout_then_tools_need_a_session() {
    let ctx = live_context().await;

    let out = call(&ctx, "salesforce_logout", json!({})).await;
    assert_eq!(out["was_authenticated"], true, "{out}");

    let query = call(&ctx, "execute_soql_query", json!({"query": "SELECT Id FROM User LIMIT 1"})).await;
    assert_eq!(query["success"], false);
    assert_eq!(query["error_type"], "NotAuthenticated");
}
