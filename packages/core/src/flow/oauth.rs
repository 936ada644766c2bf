use super::node::NodeParameter;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GrantType {
    #[default]
    AuthorizationCode,
    ClientCredentials,
}

/// Where the host places client credentials when exchanging or refreshing tokens.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClientAuthentication {
    #[default]
    Header,
    Body,
}

/// OAuth2 provider a node needs the host to authorize.
/// The host owns the authorization flow and token refresh; nodes only declare it.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct OAuthProvider {
    /// Unique identifier for this provider, also used as the credential type name
    pub id: String,
    /// Display name shown to users
    pub name: String,
    pub auth_url: String,
    pub token_url: String,
    /// Can be empty if provided by environment or user input
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub grant_type: GrantType,
    /// Extra query parameters appended to the authorization request (`access_type=offline`)
    pub auth_query_params: Vec<(String, String)>,
    pub authentication: ClientAuthentication,
    pub pkce_required: bool,
    /// Inputs the user fills in before authorizing, e.g. a region. The host passes
    /// them to `NodeLogic::resolve_oauth_provider` to get the final URLs.
    pub fields: Vec<NodeParameter>,
}

impl OAuthProvider {
    pub fn new(id: &str, name: &str) -> Self {
        OAuthProvider {
            id: id.to_string(),
            name: name.to_string(),
            auth_url: String::new(),
            token_url: String::new(),
            client_id: String::new(),
            client_secret: None,
            scopes: Vec::new(),
            grant_type: GrantType::AuthorizationCode,
            auth_query_params: Vec::new(),
            authentication: ClientAuthentication::Header,
            pkce_required: true,
            fields: Vec::new(),
        }
    }

    pub fn set_auth_url(mut self, url: &str) -> Self {
        self.auth_url = url.to_string();
        self
    }

    pub fn set_token_url(mut self, url: &str) -> Self {
        self.token_url = url.to_string();
        self
    }

    pub fn set_client_id(mut self, client_id: &str) -> Self {
        self.client_id = client_id.to_string();
        self
    }

    pub fn set_client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = Some(client_secret.to_string());
        self
    }

    pub fn add_scope(mut self, scope: &str) -> Self {
        self.scopes.push(scope.to_string());
        self
    }

    pub fn set_grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = grant_type;
        self
    }

    pub fn add_auth_query_param(mut self, key: &str, value: &str) -> Self {
        self.auth_query_params
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn set_authentication(mut self, authentication: ClientAuthentication) -> Self {
        self.authentication = authentication;
        self
    }

    pub fn set_pkce_required(mut self, required: bool) -> Self {
        self.pkce_required = required;
        self
    }

    pub fn add_field(mut self, field: NodeParameter) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

/// Token the host hands to a node after OAuth authentication
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp when the access token expires
    pub expires_at: Option<u64>,
    /// Usually "Bearer"
    pub token_type: Option<String>,
}

impl OAuthToken {
    pub fn new(access_token: String) -> Self {
        OAuthToken {
            access_token,
            refresh_token: None,
            expires_at: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            // Consider expired if less than 60 seconds remaining
            expires_at <= now + 60
        } else {
            false
        }
    }

    pub fn bearer_header(&self) -> String {
        format!(
            "{} {}",
            self.token_type.as_deref().unwrap_or("Bearer"),
            self.access_token
        )
    }
}

/// Options forwarded to the host's OAuth2 request helper
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OAuth2RequestOptions {
    /// Send client id and secret in the body of the refresh request
    pub include_credentials_on_refresh_on_body: bool,
}

/// Collection of OAuth tokens keyed by provider ID
pub type OAuthTokens = HashMap<String, OAuthToken>;
