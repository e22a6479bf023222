//! Create/update round trips against a live org.

use super::common::{call, live_context, unique_suffix};
use serde_json::json;

#[tokio::test]
#[ignore]
async fn test_apex_class_create_then_update() {
    let ctx = live_context().await;
    let name = format!("BusbarIntTest{}", unique_suffix());

    let created = call(
        &ctx,
        "create_apex_class",
        json!({
            "class_name": name,
            "body": format!("public with sharing class {name} {{ }}")
        }),
    )
    .await;
    assert_eq!(created["success"], true, "{created}");
    assert!(created["job_id"].is_string());

    let again = call(
        &ctx,
        "create_apex_class",
        json!({"class_name": name, "body": format!("public class {name} {{ }}")}),
    )
    .await;
    assert_eq!(again["error_type"], "ConflictError", "{again}");

    let updated = call(
        &ctx,
        "update_apex_class",
        json!({
            "class_name": name,
            "body": format!(
                "public with sharing class {name} {{ public static String ping() {{ return 'pong'; }} }}"
            )
        }),
    )
    .await;
    assert_eq!(updated["success"], true, "{updated}");
}

#[tokio::test]
#[ignore]
async fn test_custom_object_and_field() {
    let ctx = live_context().await;
    let object = format!("BusbarInt{}__c", unique_suffix());

    let created = call(
        &ctx,
        "create_custom_object",
        json!({
            "object_name": object,
            "label": "Busbar Int",
            "plural_label": "Busbar Ints"
        }),
    )
    .await;
    assert_eq!(created["success"], true, "{created}");

    let field = call(
        &ctx,
        "create_custom_field",
        json!({
            "object_name": object,
            "field_name": "Customer_Code",
            "label": "Customer Code",
            "field_type": "Text",
            "length": 50
        }),
    )
    .await;
    assert_eq!(field["success"], true, "{field}");
    assert_eq!(field["field_name"], "Customer_Code__c");
    assert!(field["permission_grant"].is_object());

    let rows = call(
        &ctx,
        "execute_soql_query",
        json!({
            "query": format!(
                "SELECT QualifiedApiName FROM FieldDefinition \
                 WHERE EntityDefinition.QualifiedApiName = '{object}'"
            ),
            "use_tooling_api": true
        }),
    )
    .await;
    assert_eq!(rows["success"], true, "{rows}");
    assert!(rows["records"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["QualifiedApiName"] == "Customer_Code__c"));
}

#[tokio::test]
#[ignore]
async fn test_lwc_component_with_defaults() {
    let ctx = live_context().await;
    let name = format!("busbarInt{}", unique_suffix());

    let created = call(&ctx, "create_lwc_component", json!({"component_name": name})).await;
    assert_eq!(created["success"], true, "{created}");

    let status = call(
        &ctx,
        "get_metadata_deploy_status",
        json!({"job_id": created["job_id"]}),
    )
    .await;
    assert_eq!(status["success"], true, "{status}");
    assert_eq!(status["done"], true);
}
