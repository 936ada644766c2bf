#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use zoho_flow::flow::execution::RunContext;
use zoho_flow::flow::http::{HttpRequest, HttpResponse, HttpTransport};
use zoho_flow::flow::oauth::OAuthToken;
use zoho_flow_catalog_analytics::credentials::{
    ZOHO_ANALYTICS_PROVIDER_ID, ZOHO_ANALYTICS_TOKEN_CREDENTIALS,
};
use zoho_flow_types::reqwest::Method;
use zoho_flow_types::{Bytes, Result, Value, anyhow, async_trait, json::json};

pub const API_URL: &str = "https://analyticsapi.zoho.eu";

struct Route {
    method: Method,
    path: String,
    response: HttpResponse,
}

/// Records every request and answers from a route table. Unmatched requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    seen: Mutex<Vec<HttpRequest>>,
    fail_network: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(
            method,
            path,
            status,
            &[("content-type", "application/json")],
            Bytes::from(body.to_string()),
        );
    }

    pub fn respond_raw(
        &self,
        method: Method,
        path: &str,
        status: u16,
        headers: &[(&str, &str)],
        body: Bytes,
    ) {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            response: HttpResponse {
                status,
                headers,
                body,
            },
        });
    }

    pub fn fail_network(&self) {
        *self.fail_network.lock().unwrap() = true;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.seen.lock().unwrap().push(request.clone());
        if *self.fail_network.lock().unwrap() {
            return Err(anyhow!("connection refused"));
        }

        let path = request
            .url
            .strip_prefix(API_URL)
            .unwrap_or(&request.url)
            .to_string();
        let routes = self.routes.lock().unwrap();
        let response = routes
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.path == path)
            .map(|route| route.response.clone())
            .unwrap_or(HttpResponse {
                status: 404,
                headers: BTreeMap::new(),
                body: Bytes::from(
                    json!({"status": "failure", "data": {"errorMessage": "not found"}}).to_string(),
                ),
            });
        Ok(response)
    }
}

/// Authenticated context in the EU region.
pub fn context(transport: Arc<MockTransport>) -> RunContext {
    RunContext::new("Zoho Analytics", transport)
        .set_credentials(ZOHO_ANALYTICS_PROVIDER_ID, json!({"country": "eu"}))
        .set_credentials(
            ZOHO_ANALYTICS_TOKEN_CREDENTIALS,
            json!({"domain": "analyticsapi.zoho.eu", "oauthToken": "static-token"}),
        )
        .set_oauth_token(
            ZOHO_ANALYTICS_PROVIDER_ID,
            OAuthToken::new("access-token".to_string()),
        )
}

/// Context with organisation 1, workspace 2 and view 3 selected.
pub fn selected_context(transport: Arc<MockTransport>) -> RunContext {
    context(transport)
        .set_parameter("organisationId", json!("1"))
        .set_parameter("workspaceId", json!("2"))
        .set_parameter("viewId", json!("3"))
}

pub fn success(data: Value) -> Value {
    json!({"status": "success", "summary": "ok", "data": data})
}
