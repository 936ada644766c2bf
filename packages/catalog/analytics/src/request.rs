//! Builds and sends Zoho Analytics API calls.

use crate::config::{self, CONFIG_PARAM};
use crate::credentials::{
    ZOHO_ANALYTICS_PROVIDER_ID, ZOHO_ANALYTICS_TOKEN_CREDENTIALS, ZohoAnalyticsCredentials,
    ZohoTokenCredentials,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::context::ExecutionContext,
    http::{FormPart, HttpRequest, HttpResponse, RequestBody, ResponseFormat},
    oauth::OAuth2RequestOptions,
};
use zoho_flow_types::{Map, Value, json, reqwest::Method};

pub const API_PATH: &str = "/restapi/v2";
pub const ORG_ID_HEADER: &str = "ZANALYTICS-ORGID";

const JSON_CONTENT_TYPE: &str = "application/json";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// One Zoho API call before credentials are resolved.
///
/// Empty bodies and empty query strings are left off the request entirely.
#[derive(Debug, Clone)]
pub struct ZohoRequest {
    method: Method,
    endpoint: String,
    headers: BTreeMap<String, String>,
    body: Map<String, Value>,
    files: Vec<FormPart>,
    query: Vec<(String, String)>,
    override_url: Option<String>,
    multipart: bool,
    download: bool,
}

impl ZohoRequest {
    pub fn new(method: Method, endpoint: &str) -> Self {
        ZohoRequest {
            method,
            endpoint: endpoint.to_string(),
            headers: BTreeMap::new(),
            body: Map::new(),
            files: Vec::new(),
            query: Vec::new(),
            override_url: None,
            multipart: false,
            download: false,
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: &str) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: &str) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: &str) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Scopes the call to an organisation through `ZANALYTICS-ORGID`.
    pub fn organisation(self, organisation_id: &str) -> Self {
        self.header(ORG_ID_HEADER, organisation_id)
    }

    pub fn body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    pub fn body_field(mut self, name: &str, value: Value) -> Self {
        self.body.insert(name.to_string(), value);
        self
    }

    pub fn file(mut self, part: FormPart) -> Self {
        self.files.push(part);
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Serializes `config` into the `CONFIG` query parameter.
    pub fn config<T: Serialize>(self, config: &T) -> zoho_flow_types::Result<Self> {
        let encoded = config::encode(config)?;
        Ok(self.query(CONFIG_PARAM, &encoded))
    }

    /// Uses a provider-issued URL (e.g. a next-page link) verbatim.
    pub fn next_page_url(mut self, url: &str) -> Self {
        if !url.is_empty() {
            self.override_url = Some(url.to_string());
        }
        self
    }

    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Asks for the raw response: `accept: */*`, no JSON decoding.
    pub fn download(mut self) -> Self {
        self.download = true;
        self
    }

    pub fn into_http_request(self, api_url: &str) -> HttpRequest {
        let url = match self.override_url {
            Some(url) => url,
            None => format!("{}{}", api_url.trim_end_matches('/'), self.endpoint),
        };

        let mut request = HttpRequest::new(self.method, &url);
        request.set_header("Content-Type", JSON_CONTENT_TYPE);
        for (name, value) in self.headers {
            request.set_header(&name, value);
        }
        if self.multipart {
            request.set_header("Content-Type", MULTIPART_CONTENT_TYPE);
        }
        if self.download {
            request.set_header("accept", "*/*");
            request.response_format = ResponseFormat::Binary;
        }

        if !self.query.is_empty() {
            request.query = Some(self.query);
        }

        request.body = if self.multipart {
            let mut parts: Vec<FormPart> = self
                .body
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(text) => FormPart::text(&name, text),
                    other => FormPart::text(&name, other.to_string()),
                })
                .collect();
            parts.extend(self.files);
            (!parts.is_empty()).then_some(RequestBody::Multipart(parts))
        } else if self.body.is_empty() {
            None
        } else {
            Some(RequestBody::Json(Value::Object(self.body)))
        };

        request
    }
}

fn load_credentials<T: DeserializeOwned>(node: &str, credential_type: &str, value: Value) -> NodeResult<T> {
    json::from_value(value).map_err(|e| {
        NodeError::configuration(node, format!("Credentials '{}' are invalid", credential_type))
            .with_cause(e)
    })
}

/// Pulls Zoho's `errorMessage` out of a failure body when there is one.
fn failure_message(response: &HttpResponse) -> String {
    let detail = response.json().ok().and_then(|body| {
        body.pointer("/data/errorMessage")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match detail {
        Some(detail) => format!("Zoho Analytics returned {}: {}", response.status, detail),
        None => format!(
            "Zoho Analytics returned {}: {}",
            response.status,
            response.text()
        ),
    }
}

fn check_status(node: &str, response: HttpResponse) -> NodeResult<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    Err(NodeError::api(node, failure_message(&response)).with_status(response.status))
}

fn decode_json(node: &str, response: &HttpResponse) -> NodeResult<Value> {
    response.json().map_err(|e| {
        NodeError::api(node, "Zoho Analytics returned a body that is not JSON")
            .with_status(response.status)
            .with_cause(e)
    })
}

async fn send_oauth2(context: &dyn ExecutionContext, request: ZohoRequest) -> NodeResult<HttpResponse> {
    let node = context.node_name().to_string();
    let stored = context
        .get_credentials(ZOHO_ANALYTICS_PROVIDER_ID)
        .await
        .map_err(|e| {
            NodeError::configuration(&node, "Zoho Analytics credentials are not configured")
                .with_cause(e)
        })?;
    let credentials: ZohoAnalyticsCredentials =
        load_credentials(&node, ZOHO_ANALYTICS_PROVIDER_ID, stored)?;

    let http = request.into_http_request(&credentials.api_url());
    tracing::debug!(
        method = %http.method,
        url = %http.url,
        has_body = http.body.is_some(),
        "Sending Zoho Analytics request"
    );

    let options = OAuth2RequestOptions {
        include_credentials_on_refresh_on_body: true,
    };
    let response = context
        .request_oauth2(ZOHO_ANALYTICS_PROVIDER_ID, http, options)
        .await
        .map_err(|e| NodeError::api(&node, "Zoho Analytics request failed").with_cause(e))?;

    check_status(&node, response)
}

/// Sends a request with the host-managed OAuth2 credential and decodes the JSON response.
pub async fn zoho_api_request(context: &dyn ExecutionContext, request: ZohoRequest) -> NodeResult<Value> {
    let node = context.node_name().to_string();
    let response = send_oauth2(context, request).await?;
    decode_json(&node, &response)
}

/// Sends a request authenticated with a static token credential.
pub async fn zoho_token_request(context: &dyn ExecutionContext, request: ZohoRequest) -> NodeResult<Value> {
    let node = context.node_name().to_string();
    let stored = context
        .get_credentials(ZOHO_ANALYTICS_TOKEN_CREDENTIALS)
        .await
        .map_err(|e| {
            NodeError::configuration(&node, "Zoho Analytics token credentials are not configured")
                .with_cause(e)
        })?;
    let credentials: ZohoTokenCredentials =
        load_credentials(&node, ZOHO_ANALYTICS_TOKEN_CREDENTIALS, stored)?;

    let mut http = request.into_http_request(&credentials.api_url());
    http.set_header("Authorization", format!("Bearer {}", credentials.oauth_token));
    tracing::debug!(method = %http.method, url = %http.url, "Sending Zoho Analytics token request");

    let response = context
        .http_request(http)
        .await
        .map_err(|e| NodeError::api(&node, "Zoho Analytics request failed").with_cause(e))?;
    let response = check_status(&node, response)?;
    decode_json(&node, &response)
}

/// Sends a multipart request, used for template uploads and data imports.
pub async fn zoho_file_upload_request(
    context: &dyn ExecutionContext,
    request: ZohoRequest,
) -> NodeResult<Value> {
    zoho_api_request(context, request.multipart()).await
}

/// Fetches a file. The raw response is returned so callers can read bytes and headers.
pub async fn zoho_file_download_request(
    context: &dyn ExecutionContext,
    request: ZohoRequest,
) -> NodeResult<HttpResponse> {
    send_oauth2(context, request.download()).await
}
