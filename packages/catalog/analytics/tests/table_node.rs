mod common;

use common::{MockTransport, context, selected_context, success};
use zoho_flow::flow::error::ErrorKind;
use zoho_flow::flow::http::{FormValue, RequestBody};
use zoho_flow::flow::item::Item;
use zoho_flow::flow::node::NodeLogic;
use zoho_flow_catalog_analytics::ZohoAnalyticsTableNode;
use zoho_flow_catalog_analytics::request::ORG_ID_HEADER;
use zoho_flow_types::json::json;
use zoho_flow_types::reqwest::Method;
use zoho_flow_types::tokio;

const ROWS: &str = "/restapi/v2/workspaces/2/views/3/rows";
const DATA: &str = "/restapi/v2/workspaces/2/views/3/data";

fn items(count: usize) -> Vec<Item> {
    (0..count).map(|i| Item::new(json!({"index": i}))).collect()
}

#[tokio::test]
async fn test_add_row() {
    let transport = MockTransport::new();
    transport.respond(Method::POST, ROWS, 200, success(json!({"rows": 1})));
    let mut context = selected_context(transport.clone())
        .set_parameter("operation", json!("addRow"))
        .set_parameter(
            "columns",
            json!([
                {"columnName": "Region", "columnValue": "East"},
                {"columnName": "Amount", "dataType": "number", "columnValue": "10"}
            ]),
        );

    let output = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].json, json!({"rows": 1}));
    assert_eq!(output[0].paired_item, Some(0));

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, format!("{}{}", common::API_URL, ROWS));
    assert_eq!(request.header(ORG_ID_HEADER), Some("1"));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(
        request.query_param("CONFIG"),
        Some(r#"{"columns":{"Amount":"10","Region":"East"}}"#)
    );
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_delete_all_rows_ignores_criteria() {
    let transport = MockTransport::new();
    transport.respond(Method::DELETE, ROWS, 200, success(json!({"deletedRows": 42})));
    let mut context = selected_context(transport.clone())
        .set_parameter("operation", json!("deleteData"))
        .set_parameter("criteria", json!("\"Region\"='East'"))
        .set_parameter("modifyAll", json!(true));

    let output = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();
    assert_eq!(output[0].json, json!({"deletedRows": 42}));
    assert_eq!(
        transport.last_request().query_param("CONFIG"),
        Some(r#"{"deleteAllRows":true}"#)
    );
}

#[tokio::test]
async fn test_update_with_criteria() {
    let transport = MockTransport::new();
    transport.respond(Method::PUT, ROWS, 200, success(json!({"updatedRows": 3})));
    let mut context = selected_context(transport.clone())
        .set_parameter("operation", json!("updateData"))
        .set_parameter("columns", json!([{"columnName": "A", "columnValue": "1"}]))
        .set_parameter("criteria", json!("X=1"));

    ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::PUT);
    assert_eq!(
        request.query_param("CONFIG"),
        Some(r#"{"columns":{"A":"1"},"criteria":"X=1"}"#)
    );
}

#[tokio::test]
async fn test_export_without_criteria() {
    let transport = MockTransport::new();
    transport.respond(Method::GET, DATA, 200, json!({"data": [{"Region": "East"}]}));
    let mut context =
        selected_context(transport.clone()).set_parameter("operation", json!("exportData"));

    let output = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();
    assert_eq!(output[0].json, json!([{"Region": "East"}]));
    assert_eq!(
        transport.last_request().query_param("CONFIG"),
        Some(r#"{"responseFormat":"json"}"#)
    );
}

#[tokio::test]
async fn test_import_data_sends_multipart() {
    let transport = MockTransport::new();
    transport.respond(Method::POST, DATA, 200, success(json!({"importSummary": {}})));
    let mut context = selected_context(transport.clone())
        .set_parameter("operation", json!("importData"))
        .set_parameter("importType", json!("truncateadd"))
        .set_parameter("data", json!("[{\"Region\":\"East\"}]"));

    ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.header("content-type"), Some("multipart/form-data"));
    assert_eq!(
        request.query_param("CONFIG"),
        Some(r#"{"importType":"truncateadd","fileType":"json","autoIdentify":false,"retainColumnNames":true}"#)
    );
    match request.body {
        Some(RequestBody::Multipart(parts)) => {
            assert_eq!(parts.len(), 1);
            assert_eq!(parts[0].name, "DATA");
            assert_eq!(
                parts[0].value,
                FormValue::Text("[{\"Region\":\"East\"}]".to_string())
            );
        }
        other => panic!("expected multipart body, got {:?}", other),
    }
}

#[tokio::test]
async fn test_import_new_table_skips_view() {
    let transport = MockTransport::new();
    transport.respond(
        Method::POST,
        "/restapi/v2/workspaces/2/data",
        200,
        success(json!({"viewId": "99"})),
    );
    let mut context = context(transport.clone())
        .set_parameter("organisationId", json!("1"))
        .set_parameter("workspaceId", json!("2"))
        .set_parameter("operation", json!("importNewTable"))
        .set_parameter("tableName", json!("Sales"))
        .set_parameter("data", json!([{"Region": "East"}]));

    let output = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();
    assert_eq!(output[0].json, json!({"viewId": "99"}));
    assert_eq!(
        transport.last_request().query_param("CONFIG"),
        Some(r#"{"tableName":"Sales","fileType":"json","autoIdentify":false,"retainColumnNames":true}"#)
    );
}

#[tokio::test]
async fn test_empty_import_data_is_input_error() {
    let transport = MockTransport::new();
    let mut context = selected_context(transport.clone())
        .set_parameter("operation", json!("importData"))
        .set_parameter("data", json!("  "));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UserInput);
    assert_eq!(error.item_index, Some(0));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_missing_view_is_configuration_error() {
    let transport = MockTransport::new();
    let mut context = context(transport)
        .set_parameter("organisationId", json!("1"))
        .set_parameter("workspaceId", json!("2"))
        .set_parameter("operation", json!("addRow"));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_unknown_operation_is_configuration_error() {
    let transport = MockTransport::new();
    let mut context = selected_context(transport).set_parameter("operation", json!("dropTable"));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_continue_on_fail_keeps_every_item() {
    let transport = MockTransport::new();
    transport.respond(Method::DELETE, ROWS, 200, success(json!({"deletedRows": 1})));
    let mut context = selected_context(transport.clone())
        .set_items(items(3))
        .set_parameter("operation", json!("deleteData"))
        .set_parameter("criteria", json!("X=1"))
        .set_item_parameter(1, "modifyAll", json!("not a bool"))
        .set_continue_on_fail(true);

    let output = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap();
    assert_eq!(output.len(), 3);
    assert!(!output[0].is_error());
    assert!(output[1].is_error());
    assert!(!output[2].is_error());
    assert_eq!(output[1].paired_item, Some(1));
    assert_eq!(output[1].json, json!({"index": 1}));

    let error = output[1].error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::UserInput);
    assert_eq!(error.item_index, Some(1));
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(context.logs().len(), 1);
}

#[tokio::test]
async fn test_failure_aborts_with_item_index() {
    let transport = MockTransport::new();
    transport.respond(Method::DELETE, ROWS, 200, success(json!({"deletedRows": 1})));
    let mut context = selected_context(transport.clone())
        .set_items(items(3))
        .set_parameter("operation", json!("deleteData"))
        .set_parameter("criteria", json!("X=1"))
        .set_item_parameter(1, "modifyAll", json!("not a bool"));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.item_index, Some(1));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_api_failure_carries_status() {
    let transport = MockTransport::new();
    transport.respond(
        Method::POST,
        ROWS,
        400,
        json!({"status": "failure", "data": {"errorCode": 7138, "errorMessage": "Column Region not found"}}),
    );
    let mut context = selected_context(transport)
        .set_parameter("operation", json!("addRow"))
        .set_parameter("columns", json!([{"columnName": "Region", "columnValue": "East"}]));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Api);
    assert_eq!(error.http_status, Some(400));
    assert_eq!(error.item_index, Some(0));
    assert!(error.to_string().contains("Column Region not found"));
}

#[tokio::test]
async fn test_network_failure_is_api_error() {
    let transport = MockTransport::new();
    transport.fail_network();
    let mut context = selected_context(transport).set_parameter("operation", json!("exportData"));

    let error = ZohoAnalyticsTableNode::new().run(&mut context).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Api);
    assert!(error.http_status.is_none());
    assert!(error.cause.is_some());
}
