//! Dropdown loaders for the organisation → workspace → view → column chain.

use crate::config::view_meta_config;
use crate::request::{API_PATH, ZohoRequest, zoho_api_request};
use crate::selection::Selection;
use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::context::ExecutionContext,
    node::NodeOption,
};
use zoho_flow_types::{Value, utils::id_to_string};

pub const GET_ORGANISATIONS: &str = "getOrganisations";
pub const GET_WORKSPACES: &str = "getWorkspaces";
pub const GET_VIEWS: &str = "getViews";
pub const GET_COLUMNS: &str = "getColumns";

/// Maps `{<name_key>, <value_key>}` objects at `pointer` into options.
/// Entries without a usable id are skipped.
fn project(body: &Value, pointer: &str, name_key: &str, value_key: &str) -> Vec<NodeOption> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let value = id_to_string(entry.get(value_key)?)?;
                    let name = entry
                        .get(name_key)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| value.clone());
                    Some(NodeOption::new(name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub async fn list_organisations(context: &dyn ExecutionContext) -> NodeResult<Vec<NodeOption>> {
    let request = ZohoRequest::get(&format!("{}/orgs", API_PATH));
    let body = zoho_api_request(context, request).await?;
    Ok(project(&body, "/data/orgs", "orgName", "orgId"))
}

/// Owned workspaces followed by shared ones. A workspace in both lists appears twice.
pub async fn list_workspaces(context: &dyn ExecutionContext) -> NodeResult<Vec<NodeOption>> {
    let node = context.node_name().to_string();
    let selection = Selection::from_context(context);
    let organisation_id = selection.organisation(&node)?;
    let request = ZohoRequest::get(&format!("{}/workspaces", API_PATH)).organisation(organisation_id);

    let body = zoho_api_request(context, request).await?;
    let mut options = project(&body, "/data/ownedWorkspaces", "workspaceName", "workspaceId");
    options.extend(project(
        &body,
        "/data/sharedWorkspaces",
        "workspaceName",
        "workspaceId",
    ));
    Ok(options)
}

/// Only views of type `Table` accept rows, so everything else is filtered out.
pub async fn list_views(context: &dyn ExecutionContext) -> NodeResult<Vec<NodeOption>> {
    let node = context.node_name().to_string();
    let selection = Selection::from_context(context);
    let organisation_id = selection.organisation(&node)?;
    let workspace_id = selection.workspace(&node)?;

    let request = ZohoRequest::get(&format!("{}/workspaces/{}/views", API_PATH, workspace_id))
        .organisation(organisation_id);
    let body = zoho_api_request(context, request).await?;

    let tables = body
        .pointer("/data/views")
        .and_then(Value::as_array)
        .map(|views| {
            views
                .iter()
                .filter(|view| view.get("viewType").and_then(Value::as_str) == Some("Table"))
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(project(
        &Value::Array(tables),
        "",
        "viewName",
        "viewId",
    ))
}

pub async fn list_columns(context: &dyn ExecutionContext) -> NodeResult<Vec<NodeOption>> {
    let node = context.node_name().to_string();
    let selection = Selection::from_context(context);
    let organisation_id = selection.organisation(&node)?;
    let view_id = selection.view(&node)?;

    let request = ZohoRequest::get(&format!("{}/views/{}", API_PATH, view_id))
        .organisation(organisation_id)
        .config(&view_meta_config())
        .map_err(|e| NodeError::configuration(&node, "Could not encode CONFIG").with_cause(e))?;
    let body = zoho_api_request(context, request).await?;

    let columns = body
        .pointer("/data/views/columns")
        .and_then(Value::as_array)
        .map(|columns| {
            columns
                .iter()
                .filter_map(|column| column.get("columnName").and_then(Value::as_str))
                .map(|name| NodeOption::new(name, name))
                .collect()
        })
        .unwrap_or_default();
    Ok(columns)
}

/// Routes a `load_options_method` name to its loader.
pub async fn load(method: &str, context: &dyn ExecutionContext) -> NodeResult<Vec<NodeOption>> {
    match method {
        GET_ORGANISATIONS => list_organisations(context).await,
        GET_WORKSPACES => list_workspaces(context).await,
        GET_VIEWS => list_views(context).await,
        GET_COLUMNS => list_columns(context).await,
        other => Err(NodeError::configuration(
            context.node_name(),
            format!("Unknown options loader '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoho_flow_types::json::json;

    #[test]
    fn test_project_accepts_numeric_ids() {
        let body = json!({"data": {"orgs": [
            {"orgId": 1, "orgName": "Acme"},
            {"orgId": "2", "orgName": "Globex"},
            {"orgName": "No id"}
        ]}});

        assert_eq!(
            project(&body, "/data/orgs", "orgName", "orgId"),
            vec![NodeOption::new("Acme", "1"), NodeOption::new("Globex", "2")]
        );
    }

    #[test]
    fn test_project_missing_list_is_empty() {
        assert!(project(&json!({"data": {}}), "/data/orgs", "orgName", "orgId").is_empty());
    }
}
