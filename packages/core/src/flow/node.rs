use super::error::NodeResult;
use super::execution::context::ExecutionContext;
use super::item::Item;
use super::oauth::OAuthProvider;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zoho_flow_types::{Value, async_trait, json};

/// Entry in a dropdown populated by the host editor.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct NodeOption {
    pub name: String,
    pub value: String,
}

impl NodeOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        NodeOption {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    String,
    Boolean,
    Options,
    Json,
    /// Repeatable group of fields, described by `schema`
    Collection,
}

/// Shows a parameter only when another parameter holds one of the listed values.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct DisplayCondition {
    pub parameter: String,
    pub values: Vec<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeParameter {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: Option<Value>,
    pub options: Vec<NodeOption>,
    pub required: bool,
    /// Name of the loader the editor calls to fill the dropdown
    pub load_options_method: Option<String>,
    /// Parameters that must be set before the loader can run
    pub load_options_depends_on: Vec<String>,
    pub show_when: Vec<DisplayCondition>,
    pub schema: Option<String>,
}

impl NodeParameter {
    pub fn new(name: &str, display_name: &str, description: &str, parameter_type: ParameterType) -> Self {
        NodeParameter {
            name: name.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            parameter_type,
            default_value: None,
            options: Vec::new(),
            required: false,
            load_options_method: None,
            load_options_depends_on: Vec::new(),
            show_when: Vec::new(),
            schema: None,
        }
    }

    pub fn set_default_value(&mut self, value: Option<Value>) -> &mut Self {
        self.default_value = value;
        self
    }

    pub fn set_options(&mut self, options: Vec<NodeOption>) -> &mut Self {
        self.options = options;
        self
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn set_load_options(&mut self, method: &str, depends_on: &[&str]) -> &mut Self {
        self.load_options_method = Some(method.to_string());
        self.load_options_depends_on = depends_on.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn show_when(&mut self, parameter: &str, values: &[&str]) -> &mut Self {
        self.show_when.push(DisplayCondition {
            parameter: parameter.to_string(),
            values: values.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn set_schema<T: JsonSchema>(&mut self) -> &mut Self {
        let schema = schemars::schema_for!(T);
        self.schema = json::to_string(&schema).ok();
        self
    }

    /// Whether the parameter is visible given the values currently set on the node.
    pub fn is_visible(&self, lookup: impl Fn(&str) -> Option<Value>) -> bool {
        self.show_when.iter().all(|condition| {
            lookup(&condition.parameter)
                .and_then(|value| value.as_str().map(str::to_string))
                .is_some_and(|value| condition.values.contains(&value))
        })
    }
}

/// Static description of a node: what the editor shows and which credentials it needs.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub friendly_name: String,
    pub description: String,
    pub category: String,
    pub icon: Option<String>,
    pub version: u32,
    pub parameters: Vec<NodeParameter>,
    pub oauth_providers: Vec<OAuthProvider>,
}

impl Node {
    pub fn new(name: &str, friendly_name: &str, description: &str, category: &str) -> Self {
        Node {
            name: name.to_string(),
            friendly_name: friendly_name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            icon: None,
            version: 1,
            parameters: Vec::new(),
            oauth_providers: Vec::new(),
        }
    }

    pub fn add_icon(&mut self, icon: &str) {
        self.icon = Some(icon.to_string());
    }

    pub fn add_parameter(
        &mut self,
        name: &str,
        display_name: &str,
        description: &str,
        parameter_type: ParameterType,
    ) -> &mut NodeParameter {
        self.parameters.push(NodeParameter::new(
            name,
            display_name,
            description,
            parameter_type,
        ));
        let last = self.parameters.len() - 1;
        &mut self.parameters[last]
    }

    pub fn add_oauth_provider(&mut self, provider: OAuthProvider) {
        self.oauth_providers.push(provider);
    }

    pub fn get_parameter(&self, name: &str) -> Option<&NodeParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Behaviour of a node type. The host calls `run` once per execution with all input items.
#[async_trait]
pub trait NodeLogic: Send + Sync {
    fn get_node(&self) -> Node;

    async fn run(&self, context: &mut dyn ExecutionContext) -> NodeResult<Vec<Item>>;

    /// Provider to authorize against once the user has filled in its `fields`.
    fn resolve_oauth_provider(&self, provider_id: &str, _credentials: &Value) -> Option<OAuthProvider> {
        self.get_node()
            .oauth_providers
            .into_iter()
            .find(|provider| provider.id == provider_id)
    }

    /// Fills a dropdown for the editor. `method` is a parameter's `load_options_method`.
    async fn load_options(
        &self,
        method: &str,
        context: &mut dyn ExecutionContext,
    ) -> NodeResult<Vec<NodeOption>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoho_flow_types::json::json;

    #[test]
    fn test_add_parameter_builder() {
        let mut node = Node::new("test", "Test", "A test node", "Data/Test");
        node.add_parameter("operation", "Operation", "What to do", ParameterType::Options)
            .set_options(vec![NodeOption::new("Add Row", "addRow")])
            .set_default_value(Some(json!("addRow")));
        node.add_parameter("criteria", "Criteria", "Row filter", ParameterType::String)
            .show_when("operation", &["deleteData", "updateData"]);

        assert_eq!(node.parameters.len(), 2);
        let operation = node.get_parameter("operation").unwrap();
        assert_eq!(operation.options[0].value, "addRow");
        assert_eq!(operation.default_value, Some(json!("addRow")));
    }

    #[test]
    fn test_visibility_follows_display_conditions() {
        let mut parameter = NodeParameter::new("criteria", "Criteria", "", ParameterType::String);
        parameter.show_when("operation", &["deleteData"]);

        assert!(parameter.is_visible(|_| Some(json!("deleteData"))));
        assert!(!parameter.is_visible(|_| Some(json!("addRow"))));
        assert!(!parameter.is_visible(|_| None));
    }

    #[test]
    fn test_set_schema_serializes_json_schema() {
        let mut parameter = NodeParameter::new("field", "Field", "", ParameterType::Collection);
        parameter.set_schema::<NodeOption>();
        let schema = parameter.schema.unwrap();
        assert!(schema.contains("\"name\""));
        assert!(schema.contains("\"value\""));
    }
}
