use super::{CATEGORY, ICON, collect_outcome, parameter, read_operation, response_data, with_config};
use crate::config::{
    ColumnEntry, ColumnValues, ImportType, add_row_config, column_values, delete_config, export_config,
    import_config, import_new_table_config, update_config,
};
use crate::credentials::{Country, oauth_provider, resolve_oauth_provider};
use crate::options::{self, GET_COLUMNS, GET_ORGANISATIONS, GET_VIEWS, GET_WORKSPACES};
use crate::request::{API_PATH, ZohoRequest, zoho_api_request, zoho_file_upload_request};
use crate::selection::Selection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::context::ExecutionContext,
    item::Item,
    node::{Node, NodeLogic, NodeOption, ParameterType},
    oauth::OAuthProvider,
};
use zoho_flow_types::{Value, async_trait, json::json};

pub const TABLE_NODE_NAME: &str = "zohoAnalytics";

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TableOperation {
    #[default]
    AddRow,
    DeleteData,
    ExportData,
    ImportData,
    ImportNewTable,
    UpdateData,
}

/// Row and bulk-data operations on a Zoho Analytics table.
#[derive(Default)]
pub struct ZohoAnalyticsTableNode {}

impl ZohoAnalyticsTableNode {
    pub fn new() -> Self {
        Self {}
    }

    async fn execute(
        &self,
        context: &dyn ExecutionContext,
        operation: TableOperation,
        selection: &Selection,
        item_index: usize,
    ) -> NodeResult<Item> {
        let node = context.node_name().to_string();
        let organisation_id = selection.organisation(&node)?;
        let workspace_id = selection.workspace(&node)?;
        let view_endpoint = |suffix: &str| -> NodeResult<String> {
            let view_id = selection.view(&node)?;
            Ok(format!(
                "{}/workspaces/{}/views/{}/{}",
                API_PATH, workspace_id, view_id, suffix
            ))
        };

        let body = match operation {
            TableOperation::AddRow => {
                let columns = columns(context, item_index)?;
                let request = ZohoRequest::post(&view_endpoint("rows")?).organisation(organisation_id);
                let request = with_config(&node, request, &add_row_config(columns))?;
                zoho_api_request(context, request).await?
            }
            TableOperation::DeleteData => {
                let criteria: String = parameter(context, "criteria", item_index, String::new())?;
                let modify_all: bool = parameter(context, "modifyAll", item_index, false)?;
                let request = ZohoRequest::delete(&view_endpoint("rows")?).organisation(organisation_id);
                let request = with_config(&node, request, &delete_config(&criteria, modify_all))?;
                zoho_api_request(context, request).await?
            }
            TableOperation::UpdateData => {
                let columns = columns(context, item_index)?;
                let criteria: String = parameter(context, "criteria", item_index, String::new())?;
                let modify_all: bool = parameter(context, "modifyAll", item_index, false)?;
                let request = ZohoRequest::put(&view_endpoint("rows")?).organisation(organisation_id);
                let config = update_config(columns, &criteria, modify_all);
                let request = with_config(&node, request, &config)?;
                zoho_api_request(context, request).await?
            }
            TableOperation::ExportData => {
                let criteria: String = parameter(context, "criteria", item_index, String::new())?;
                let request = ZohoRequest::get(&view_endpoint("data")?).organisation(organisation_id);
                let request = with_config(&node, request, &export_config(&criteria))?;
                zoho_api_request(context, request).await?
            }
            TableOperation::ImportData => {
                let endpoint = view_endpoint("data")?;
                let import_type: ImportType =
                    parameter(context, "importType", item_index, ImportType::default())?;
                let payload = import_data(context, item_index)?;
                let request = ZohoRequest::post(&endpoint)
                    .organisation(organisation_id)
                    .body_field("DATA", Value::String(payload));
                let request = with_config(&node, request, &import_config(import_type))?;
                zoho_file_upload_request(context, request).await?
            }
            TableOperation::ImportNewTable => {
                let table_name: String = parameter(context, "tableName", item_index, String::new())?;
                if table_name.is_empty() {
                    return Err(NodeError::user_input(&node, "Table name must not be empty"));
                }
                let payload = import_data(context, item_index)?;
                let endpoint = format!("{}/workspaces/{}/data", API_PATH, workspace_id);
                let request = ZohoRequest::post(&endpoint)
                    .organisation(organisation_id)
                    .body_field("DATA", Value::String(payload));
                let request = with_config(&node, request, &import_new_table_config(&table_name))?;
                zoho_file_upload_request(context, request).await?
            }
        };

        Ok(Item::new(response_data(body)).paired_with(item_index))
    }
}

fn columns(context: &dyn ExecutionContext, item_index: usize) -> NodeResult<ColumnValues> {
    let entries: Vec<ColumnEntry> = parameter(context, "columns", item_index, Vec::new())?;
    Ok(column_values(&entries))
}

/// `DATA` is sent as-is; objects and arrays are serialized to JSON text first.
fn import_data(context: &dyn ExecutionContext, item_index: usize) -> NodeResult<String> {
    let data = match context.node_parameter("data", item_index) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    };

    if data.trim().is_empty() {
        return Err(NodeError::user_input(
            context.node_name(),
            "Data to import must not be empty",
        ));
    }
    Ok(data)
}

#[async_trait]
impl NodeLogic for ZohoAnalyticsTableNode {
    fn get_node(&self) -> Node {
        let mut node = Node::new(
            TABLE_NODE_NAME,
            "Zoho Analytics",
            "Add, update, delete, import and export rows in Zoho Analytics tables",
            CATEGORY,
        );
        node.add_icon(ICON);

        node.add_parameter("operation", "Operation", "What to do with the table", ParameterType::Options)
            .set_options(vec![
                NodeOption::new("Add Row", "addRow"),
                NodeOption::new("Delete Data", "deleteData"),
                NodeOption::new("Export Data", "exportData"),
                NodeOption::new("Import Data", "importData"),
                NodeOption::new("Import New Table", "importNewTable"),
                NodeOption::new("Update Data", "updateData"),
            ])
            .set_default_value(Some(json!("addRow")))
            .set_required(true);

        node.add_parameter(
            "organisationId",
            "Organisation",
            "Organisation that owns the workspace",
            ParameterType::Options,
        )
        .set_load_options(GET_ORGANISATIONS, &[])
        .set_required(true);

        node.add_parameter("workspaceId", "Workspace", "Workspace holding the table", ParameterType::Options)
            .set_load_options(GET_WORKSPACES, &["organisationId"])
            .set_required(true);

        node.add_parameter("viewId", "Table", "Table to work on", ParameterType::Options)
            .set_load_options(GET_VIEWS, &["organisationId", "workspaceId"])
            .show_when(
                "operation",
                &["addRow", "deleteData", "exportData", "importData", "updateData"],
            )
            .set_required(true);

        node.add_parameter(
            "columns",
            "Columns",
            "Column values to write. Column names are loaded from the selected table",
            ParameterType::Collection,
        )
        .set_schema::<Vec<ColumnEntry>>()
        .set_load_options(GET_COLUMNS, &["organisationId", "viewId"])
        .show_when("operation", &["addRow", "updateData"]);

        node.add_parameter(
            "criteria",
            "Criteria",
            "Filter applied to the rows, e.g. \"Region\"='East'",
            ParameterType::String,
        )
        .set_default_value(Some(json!("")))
        .show_when("operation", &["deleteData", "exportData", "updateData"]);

        node.add_parameter(
            "modifyAll",
            "Apply To All Rows",
            "Ignore the criteria and change every row",
            ParameterType::Boolean,
        )
        .set_default_value(Some(json!(false)))
        .show_when("operation", &["deleteData", "updateData"]);

        node.add_parameter("importType", "Import Type", "How imported rows are merged", ParameterType::Options)
            .set_options(vec![
                NodeOption::new("Append", "append"),
                NodeOption::new("Truncate And Add", "truncateadd"),
                NodeOption::new("Update And Add", "updateadd"),
            ])
            .set_default_value(Some(json!("append")))
            .show_when("operation", &["importData"]);

        node.add_parameter("data", "Data", "JSON rows to import", ParameterType::Json)
            .set_required(true)
            .show_when("operation", &["importData", "importNewTable"]);

        node.add_parameter("tableName", "Table Name", "Name of the table to create", ParameterType::String)
            .set_required(true)
            .show_when("operation", &["importNewTable"]);

        node.add_oauth_provider(oauth_provider(Country::default()));

        node
    }

    async fn run(&self, context: &mut dyn ExecutionContext) -> NodeResult<Vec<Item>> {
        let operation: TableOperation = read_operation(&*context, Some(TableOperation::default()))?;
        let selection = Selection::from_context(&*context);
        let total = context.input_items().len();

        let mut output = Vec::with_capacity(total);
        for item_index in 0..total {
            let outcome = self.execute(&*context, operation, &selection, item_index).await;
            collect_outcome(context, &mut output, item_index, outcome)?;
        }

        Ok(output)
    }

    fn resolve_oauth_provider(&self, provider_id: &str, credentials: &Value) -> Option<OAuthProvider> {
        resolve_oauth_provider(provider_id, credentials)
    }

    async fn load_options(
        &self,
        method: &str,
        context: &mut dyn ExecutionContext,
    ) -> NodeResult<Vec<NodeOption>> {
        options::load(method, &*context).await
    }
}
