//! Transport-level request and response descriptors.
//!
//! Nodes build an [`HttpRequest`] and hand it to the host. The host decides how
//! it travels; [`ReqwestTransport`] is the default implementation.

use std::collections::BTreeMap;
use std::time::Duration;
use zoho_flow_types::{
    Bytes, Result, Value, anyhow, async_trait,
    reqwest::{self, Method, multipart},
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("zoho-flow/", env!("CARGO_PKG_VERSION"));

/// How the caller wants the response body treated. Picks the `Accept` header
/// when the request does not set one; decoding stays with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    /// Raw bytes, no JSON decoding
    Binary,
}

impl ResponseFormat {
    pub fn accept(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Binary => "*/*",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        data: Bytes,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

impl FormPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        FormPart {
            name: name.to_string(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: &str, data: Bytes, file_name: Option<String>, mime_type: Option<String>) -> Self {
        FormPart {
            name: name.to_string(),
            value: FormValue::File {
                data,
                file_name,
                mime_type,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A single outbound call. `query` and `body` are `None` when there is
/// nothing to send; the transport then leaves them off entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: Option<Vec<(String, String)>>,
    pub body: Option<RequestBody>,
    pub response_format: ResponseFormat,
}

impl HttpRequest {
    pub fn new(method: Method, url: &str) -> Self {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: BTreeMap::new(),
            query: None,
            body: None,
            response_format: ResponseFormat::Json,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .as_ref()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decodes the body as JSON. An empty body decodes to `null`.
    pub fn json(&self) -> Result<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(zoho_flow_types::json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests on behalf of nodes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Returns the response for any status code; only network-level failures are errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Self {
        let timeout = std::env::var("ZOHO_FLOW_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        TransportConfig {
            timeout: Duration::from_secs(timeout),
            user_agent: std::env::var("ZOHO_FLOW_HTTP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(ReqwestTransport { client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&TransportConfig::from_env())
    }

    fn build_form(parts: Vec<FormPart>) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for part in parts {
            form = match part.value {
                FormValue::Text(text) => form.text(part.name, text),
                FormValue::File {
                    data,
                    file_name,
                    mime_type,
                } => {
                    let mut file = multipart::Part::bytes(data.to_vec());
                    if let Some(file_name) = file_name {
                        file = file.file_name(file_name);
                    }
                    if let Some(mime_type) = mime_type {
                        file = file.mime_str(&mime_type)?;
                    }
                    form.part(part.name, file)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            query,
            body,
            response_format,
        } = request;

        let is_multipart = matches!(body, Some(RequestBody::Multipart(_)));
        let mut builder = self.client.request(method.clone(), &url);

        for (name, value) in &headers {
            // reqwest writes its own boundary-bearing content type for multipart bodies
            if is_multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !headers.keys().any(|name| name.eq_ignore_ascii_case("accept")) {
            builder = builder.header("accept", response_format.accept());
        }

        if let Some(query) = &query {
            builder = builder.query(query);
        }

        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(parts)) => builder.multipart(Self::build_form(parts)?),
            None => builder,
        };

        tracing::debug!("{} {}", method, url);

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        if !(200..300).contains(&status) {
            tracing::warn!("{} {} returned status {}", method, url, status);
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zoho_flow_types::json::json;
    use zoho_flow_types::tokio;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&TransportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_send_json_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/restapi/v2/orgs"))
            .and(header("authorization", "Bearer token"))
            .and(query_param("CONFIG", "{\"a\":1}"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&server)
            .await;

        let mut request = HttpRequest::new(Method::POST, &format!("{}/restapi/v2/orgs", server.uri()));
        request.set_header("Authorization", "Bearer token");
        request.query = Some(vec![("CONFIG".to_string(), "{\"a\":1}".to_string())]);
        request.body = Some(RequestBody::Json(json!({"x": 1})));

        let response = transport().send(request).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.json().unwrap(), json!({"status": "success"}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let request = HttpRequest::new(Method::GET, &format!("{}/nothing", server.uri()));
        let response = transport().send(request).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "missing");
    }

    #[tokio::test]
    async fn test_binary_response_keeps_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/render/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/pdf")
                    .set_body_bytes(b"%PDF".to_vec()),
            )
            .mount(&server)
            .await;

        let mut request = HttpRequest::new(Method::GET, &format!("{}/render/1", server.uri()));
        request.response_format = ResponseFormat::Binary;
        let response = transport().send(request).await.unwrap();

        assert_eq!(response.content_type(), Some("application/pdf"));
        assert_eq!(response.body.as_ref(), b"%PDF");
    }

    #[tokio::test]
    async fn test_multipart_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/template"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "t1"}})))
            .mount(&server)
            .await;

        let mut request = HttpRequest::new(Method::POST, &format!("{}/template", server.uri()));
        request.set_header("Content-Type", "multipart/form-data");
        request.body = Some(RequestBody::Multipart(vec![
            FormPart::text("name", "invoice"),
            FormPart::file(
                "template",
                Bytes::from_static(b"docx"),
                Some("invoice.docx".to_string()),
                None,
            ),
        ]));

        let response = transport().send(request).await.unwrap();
        assert_eq!(response.json().unwrap()["data"]["id"], json!("t1"));

        let received = server.received_requests().await.unwrap();
        let content_type = received[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_accept_header_follows_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/render/1"))
            .and(header("accept", "*/*"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(&server)
            .await;

        let request = HttpRequest::new(Method::GET, &format!("{}/orgs", server.uri()));
        assert_eq!(transport().send(request).await.unwrap().status, 200);

        let mut request = HttpRequest::new(Method::GET, &format!("{}/render/1", server.uri()));
        request.response_format = ResponseFormat::Binary;
        let response = transport().send(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"%PDF");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = HttpRequest::new(Method::GET, "https://example.com");
        request.set_header("Content-Type", "application/json");
        request.set_header("content-type", "multipart/form-data");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("CONTENT-TYPE"), Some("multipart/form-data"));
    }

    #[test]
    fn test_empty_body_decodes_to_null() {
        let response = HttpResponse {
            status: 204,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        };
        assert_eq!(response.json().unwrap(), Value::Null);
    }
}
