use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::context::ExecutionContext,
};
use zoho_flow_types::utils::id_to_string;

/// Organisation → workspace → view chain picked in the editor.
///
/// Read once from the first item; every item in a run shares it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub organisation_id: Option<String>,
    pub workspace_id: Option<String>,
    pub view_id: Option<String>,
}

impl Selection {
    pub fn from_context(context: &dyn ExecutionContext) -> Self {
        let read = |name: &str| {
            context
                .node_parameter(name, 0)
                .and_then(|value| id_to_string(&value))
        };

        Selection {
            organisation_id: read("organisationId"),
            workspace_id: read("workspaceId"),
            view_id: read("viewId"),
        }
    }

    pub fn organisation(&self, node: &str) -> NodeResult<&str> {
        required(node, self.organisation_id.as_deref(), "Organisation")
    }

    pub fn workspace(&self, node: &str) -> NodeResult<&str> {
        required(node, self.workspace_id.as_deref(), "Workspace")
    }

    pub fn view(&self, node: &str) -> NodeResult<&str> {
        required(node, self.view_id.as_deref(), "View")
    }
}

fn required<'a>(node: &str, value: Option<&'a str>, label: &str) -> NodeResult<&'a str> {
    value
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NodeError::configuration(node, format!("{} must be selected", label)))
}
