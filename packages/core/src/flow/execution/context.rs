use super::LogLevel;
use crate::flow::http::{HttpRequest, HttpResponse};
use crate::flow::item::Item;
use crate::flow::oauth::OAuth2RequestOptions;
use serde::de::DeserializeOwned;
use zoho_flow_types::{Bytes, Result, Value, anyhow, async_trait, json};

/// Services the host offers to a node while it runs.
///
/// Parameter resolution, credential storage, binary buffers, token refresh and
/// the HTTP transport all belong to the host. Nodes only consume them.
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    /// Display name of the node being executed, used to tag errors.
    fn node_name(&self) -> &str;

    fn input_items(&self) -> &[Item];

    /// Resolved value of a node parameter for one item, `None` if the user left it unset.
    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value>;

    fn continue_on_fail(&self) -> bool;

    async fn get_credentials(&self, credential_type: &str) -> Result<Value>;

    async fn binary_data_buffer(&self, item_index: usize, property: &str) -> Result<Bytes>;

    /// Sends a request as-is through the host transport.
    async fn http_request(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Sends a request authenticated with the host-managed OAuth2 credential.
    async fn request_oauth2(
        &self,
        credential_type: &str,
        request: HttpRequest,
        options: OAuth2RequestOptions,
    ) -> Result<HttpResponse>;

    fn log_message(&mut self, message: &str, log_level: LogLevel);
}

/// Typed helpers on top of [`ExecutionContext::node_parameter`].
pub trait ExecutionContextExt {
    fn evaluate_parameter<T: DeserializeOwned>(&self, name: &str, item_index: usize) -> Result<T>;

    fn evaluate_parameter_or<T: DeserializeOwned>(
        &self,
        name: &str,
        item_index: usize,
        default: T,
    ) -> Result<T>;
}

impl<C: ExecutionContext + ?Sized> ExecutionContextExt for C {
    fn evaluate_parameter<T: DeserializeOwned>(&self, name: &str, item_index: usize) -> Result<T> {
        let value = self
            .node_parameter(name, item_index)
            .ok_or_else(|| anyhow!("Parameter '{}' is not set", name))?;
        json::from_value(value).map_err(|e| anyhow!("Parameter '{}' is invalid: {}", name, e))
    }

    fn evaluate_parameter_or<T: DeserializeOwned>(
        &self,
        name: &str,
        item_index: usize,
        default: T,
    ) -> Result<T> {
        match self.node_parameter(name, item_index) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => json::from_value(value)
                .map_err(|e| anyhow!("Parameter '{}' is invalid: {}", name, e)),
        }
    }
}
