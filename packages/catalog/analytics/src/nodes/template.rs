use super::{CATEGORY, ICON, collect_outcome, parameter, read_operation, response_data};
use crate::credentials::{Country, oauth_provider, resolve_oauth_provider};
use crate::options;
use crate::request::{ZohoRequest, zoho_api_request, zoho_file_download_request, zoho_file_upload_request};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::context::ExecutionContext,
    http::FormPart,
    item::{BinaryData, Item},
    node::{Node, NodeLogic, NodeOption, ParameterType},
    oauth::OAuthProvider,
};
use zoho_flow_types::{Map, Value, async_trait, json::{self, json}};

pub const TEMPLATE_NODE_NAME: &str = "zohoAnalyticsTemplates";

const DEFAULT_BINARY_PROPERTY: &str = "data";
const DEFAULT_FORM_KEY: &str = "template";

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TemplateOperation {
    AddTemplate,
    DeleteTemplate,
    DownloadReport,
    GetTemplate,
    RenderReport,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BodyType {
    #[default]
    Json,
    PerField,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    String,
    /// `fieldValue` holds JSON text
    Array,
}

/// One entry of the per-field render payload.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub field_name: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub field_value: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldData {
    #[serde(default)]
    pub field: Vec<FieldEntry>,
}

/// Splits `a, key:b` into `(form key, binary property)` pairs.
/// Entries without a key are sent as `template`.
pub fn binary_properties(property_names: &str) -> Vec<(String, String)> {
    property_names.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((key, property)) => (key.trim().to_string(), property.trim().to_string()),
            None => (DEFAULT_FORM_KEY.to_string(), entry.to_string()),
        })
        .collect()
}

/// Folds per-field entries into the render `data` object.
pub fn field_data(node: &str, fields: &[FieldEntry]) -> NodeResult<Map<String, Value>> {
    let mut data = Map::new();
    for field in fields {
        let value = match field.field_type {
            FieldType::String => Value::String(field.field_value.clone()),
            FieldType::Array => json::from_str(&field.field_value).map_err(|e| {
                NodeError::user_input(
                    node,
                    format!("Field '{}' does not hold valid JSON", field.field_name),
                )
                .with_cause(e)
            })?,
        };
        data.insert(field.field_name.clone(), value);
    }
    Ok(data)
}

/// Template upload and report rendering.
#[derive(Default)]
pub struct ZohoAnalyticsTemplateNode {}

impl ZohoAnalyticsTemplateNode {
    pub fn new() -> Self {
        Self {}
    }

    async fn execute(
        &self,
        context: &dyn ExecutionContext,
        operation: TemplateOperation,
        item_index: usize,
    ) -> NodeResult<Item> {
        match operation {
            TemplateOperation::AddTemplate => add_template(context, item_index).await,
            TemplateOperation::DeleteTemplate => {
                let id = template_id(context, item_index)?;
                let request = ZohoRequest::delete(&format!("/template/{}", id));
                let body = zoho_api_request(context, request).await?;
                Ok(Item::new(body).paired_with(item_index))
            }
            TemplateOperation::GetTemplate => {
                let id = template_id(context, item_index)?;
                download(context, item_index, &format!("/template/{}", id), "Template").await
            }
            TemplateOperation::DownloadReport => {
                let id = template_id(context, item_index)?;
                download(context, item_index, &format!("/render/{}", id), "Report").await
            }
            TemplateOperation::RenderReport => render_report(context, item_index).await,
        }
    }
}

fn template_id(context: &dyn ExecutionContext, item_index: usize) -> NodeResult<String> {
    let id = context
        .node_parameter("id", item_index)
        .and_then(|value| zoho_flow_types::utils::id_to_string(&value))
        .unwrap_or_default();
    if id.is_empty() {
        return Err(NodeError::user_input(context.node_name(), "ID must not be empty"));
    }
    Ok(id)
}

async fn add_template(context: &dyn ExecutionContext, item_index: usize) -> NodeResult<Item> {
    let node = context.node_name().to_string();
    let item = context
        .input_items()
        .get(item_index)
        .cloned()
        .unwrap_or_default();
    if !item.has_binary() {
        return Err(NodeError::user_input(&node, "No binary data exists on item"));
    }

    let property_names: String = parameter(
        context,
        "binaryPropertyName",
        item_index,
        DEFAULT_BINARY_PROPERTY.to_string(),
    )?;

    let properties = binary_properties(&property_names);
    if properties.is_empty() {
        return Err(NodeError::user_input(&node, "No binary property name was given"));
    }

    let mut request = ZohoRequest::post("/template");
    for (form_key, property) in properties {
        let binary = item.binary.get(&property).ok_or_else(|| {
            NodeError::user_input(
                &node,
                format!("Binary property '{}' does not exist on item", property),
            )
        })?;
        let data = context
            .binary_data_buffer(item_index, &property)
            .await
            .map_err(|e| {
                NodeError::user_input(&node, format!("Could not read binary property '{}'", property))
                    .with_cause(e)
            })?;

        request = request.file(FormPart::file(
            &form_key,
            data,
            binary.file_name.clone(),
            Some(binary.mime_type.clone()),
        ));
    }

    let body = zoho_file_upload_request(context, request).await?;
    Ok(Item::new(response_data(body)).paired_with(item_index))
}

/// Keeps the input item and attaches the downloaded file under `binaryPropertyName`.
async fn download(
    context: &dyn ExecutionContext,
    item_index: usize,
    endpoint: &str,
    file_name: &str,
) -> NodeResult<Item> {
    let property: String = parameter(
        context,
        "binaryPropertyName",
        item_index,
        DEFAULT_BINARY_PROPERTY.to_string(),
    )?;
    let response = zoho_file_download_request(context, ZohoRequest::get(endpoint)).await?;

    let binary = BinaryData::prepare(response.body.clone(), Some(file_name), response.content_type());
    let source = context
        .input_items()
        .get(item_index)
        .cloned()
        .unwrap_or_default();

    Ok(Item::new(source.json)
        .with_binaries(source.binary)
        .with_binary(&property, binary)
        .paired_with(item_index))
}

async fn render_report(context: &dyn ExecutionContext, item_index: usize) -> NodeResult<Item> {
    let node = context.node_name().to_string();
    let id = template_id(context, item_index)?;
    let body_type: BodyType = parameter(context, "bodyType", item_index, BodyType::default())?;

    let data = match body_type {
        BodyType::Json => {
            match parameter(context, "body", item_index, Value::String(String::new()))? {
                Value::String(raw) => json::from_str::<Value>(&raw).map_err(|e| {
                    NodeError::user_input(&node, "Body is not valid JSON").with_cause(e)
                })?,
                parsed => parsed,
            }
        }
        BodyType::PerField => {
            let fields: Vec<FieldEntry> = parameter(context, "data.field", item_index, Vec::new())?;
            Value::Object(field_data(&node, &fields)?)
        }
    };

    let request = ZohoRequest::post(&format!("/render/{}", id))
        .body_field("data", data)
        .body_field("convertTo", json!("pdf"));
    let body = zoho_api_request(context, request).await?;
    Ok(Item::new(body).paired_with(item_index))
}

#[async_trait]
impl NodeLogic for ZohoAnalyticsTemplateNode {
    fn get_node(&self) -> Node {
        let mut node = Node::new(
            TEMPLATE_NODE_NAME,
            "Zoho Analytics Templates",
            "Upload templates and render reports with Zoho Analytics",
            CATEGORY,
        );
        node.add_icon(ICON);

        node.add_parameter("operation", "Operation", "What to do", ParameterType::Options)
            .set_options(vec![
                NodeOption::new("Add Template", "addTemplate"),
                NodeOption::new("Delete Template", "deleteTemplate"),
                NodeOption::new("Download Report", "downloadReport"),
                NodeOption::new("Get Template", "getTemplate"),
                NodeOption::new("Render Report", "renderReport"),
            ])
            .set_required(true);

        node.add_parameter(
            "id",
            "ID",
            "ID of the template or report",
            ParameterType::String,
        )
        .show_when(
            "operation",
            &["deleteTemplate", "downloadReport", "getTemplate", "renderReport"],
        );

        node.add_parameter("bodyType", "Body Type", "How the report data is given", ParameterType::Options)
            .set_options(vec![
                NodeOption::new("Json", "json"),
                NodeOption::new("Per Field", "perField"),
            ])
            .set_default_value(Some(json!("json")))
            .show_when("operation", &["renderReport"]);

        node.add_parameter("body", "Body", "JSON report data", ParameterType::Json)
            .set_default_value(Some(json!("")))
            .show_when("operation", &["renderReport"])
            .show_when("bodyType", &["json"]);

        node.add_parameter(
            "binaryPropertyName",
            "Binary Property",
            "Binary property holding the file. For uploads use sendKey1:property1,sendKey2:property2",
            ParameterType::String,
        )
        .set_default_value(Some(json!(DEFAULT_BINARY_PROPERTY)))
        .show_when("operation", &["addTemplate", "getTemplate", "downloadReport"]);

        node.add_parameter("data", "Field Data", "Report data, one field at a time", ParameterType::Collection)
            .set_schema::<FieldData>()
            .show_when("operation", &["renderReport"])
            .show_when("bodyType", &["perField"]);

        node.add_oauth_provider(oauth_provider(Country::default()));

        node
    }

    async fn run(&self, context: &mut dyn ExecutionContext) -> NodeResult<Vec<Item>> {
        let operation: TemplateOperation = read_operation(&*context, None)?;
        let total = context.input_items().len();

        let mut output = Vec::with_capacity(total);
        for item_index in 0..total {
            let outcome = self.execute(&*context, operation, item_index).await;
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
