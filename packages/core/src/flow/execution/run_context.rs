use super::{ExecutionContext, LogLevel, LogMessage};
use crate::flow::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::flow::item::Item;
use crate::flow::oauth::{OAuth2RequestOptions, OAuthToken, OAuthTokens};
use std::collections::HashMap;
use std::sync::Arc;
use zoho_flow_types::{Bytes, Map, Result, Value, anyhow, async_trait};

/// In-process host for running a node outside the editor.
///
/// Parameters are plain JSON: node-level values apply to every item and
/// per-item values override them. Token refresh is not available here, so an
/// expired token fails the request.
pub struct RunContext {
    node_name: String,
    items: Vec<Item>,
    parameters: Map<String, Value>,
    item_parameters: HashMap<usize, Map<String, Value>>,
    credentials: HashMap<String, Value>,
    oauth_tokens: OAuthTokens,
    transport: Arc<dyn HttpTransport>,
    continue_on_fail: bool,
    log_level: LogLevel,
    logs: Vec<LogMessage>,
}

impl RunContext {
    pub fn new(node_name: &str, transport: Arc<dyn HttpTransport>) -> Self {
        RunContext {
            node_name: node_name.to_string(),
            items: vec![Item::empty()],
            parameters: Map::new(),
            item_parameters: HashMap::new(),
            credentials: HashMap::new(),
            oauth_tokens: OAuthTokens::new(),
            transport,
            continue_on_fail: false,
            log_level: LogLevel::Debug,
            logs: Vec::new(),
        }
    }

    pub fn set_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn set_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn set_item_parameter(mut self, item_index: usize, name: &str, value: Value) -> Self {
        self.item_parameters
            .entry(item_index)
            .or_default()
            .insert(name.to_string(), value);
        self
    }

    pub fn set_credentials(mut self, credential_type: &str, value: Value) -> Self {
        self.credentials.insert(credential_type.to_string(), value);
        self
    }

    pub fn set_oauth_token(mut self, provider_id: &str, token: OAuthToken) -> Self {
        self.oauth_tokens.insert(provider_id.to_string(), token);
        self
    }

    pub fn set_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    pub fn set_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn logs(&self) -> &[LogMessage] {
        &self.logs
    }

    /// Supports dotted paths (`data.field`) into object-valued parameters.
    fn lookup(map: &Map<String, Value>, name: &str) -> Option<Value> {
        if let Some(value) = map.get(name) {
            return Some(value.clone());
        }

        let mut segments = name.split('.');
        let mut current = map.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

#[async_trait]
impl ExecutionContext for RunContext {
    fn node_name(&self) -> &str {
        &self.node_name
    }

    fn input_items(&self) -> &[Item] {
        &self.items
    }

    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        self.item_parameters
            .get(&item_index)
            .and_then(|params| Self::lookup(params, name))
            .or_else(|| Self::lookup(&self.parameters, name))
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }

    async fn get_credentials(&self, credential_type: &str) -> Result<Value> {
        self.credentials
            .get(credential_type)
            .cloned()
            .ok_or_else(|| anyhow!("No credentials of type '{}' configured", credential_type))
    }

    async fn binary_data_buffer(&self, item_index: usize, property: &str) -> Result<Bytes> {
        let item = self
            .items
            .get(item_index)
            .ok_or_else(|| anyhow!("Item {} does not exist", item_index))?;
        item.binary
            .get(property)
            .map(|binary| binary.data.clone())
            .ok_or_else(|| anyhow!("Item {} has no binary property '{}'", item_index, property))
    }

    async fn http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.transport.send(request).await
    }

    async fn request_oauth2(
        &self,
        credential_type: &str,
        mut request: HttpRequest,
        options: OAuth2RequestOptions,
    ) -> Result<HttpResponse> {
        let token = self
            .oauth_tokens
            .get(credential_type)
            .ok_or_else(|| anyhow!("'{}' is not authenticated", credential_type))?;

        if token.is_expired() {
            return Err(anyhow!(
                "OAuth token for '{}' has expired and must be refreshed (credentials in body: {})",
                credential_type,
                options.include_credentials_on_refresh_on_body
            ));
        }

        request.set_header("Authorization", token.bearer_header());
        self.transport.send(request).await
    }

    fn log_message(&mut self, message: &str, log_level: LogLevel) {
        match log_level {
            LogLevel::Debug => tracing::debug!(node = %self.node_name, "{}", message),
            LogLevel::Info => tracing::info!(node = %self.node_name, "{}", message),
            LogLevel::Warn => tracing::warn!(node = %self.node_name, "{}", message),
            LogLevel::Error | LogLevel::Fatal => {
                tracing::error!(node = %self.node_name, "{}", message)
            }
        }

        if log_level < self.log_level {
            return;
        }

        self.logs.push(LogMessage::new(
            message,
            log_level,
            Some(self.node_name.clone()),
        ));
    }
}
