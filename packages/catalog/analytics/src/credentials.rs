use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use zoho_flow::flow::{
    node::{NodeOption, NodeParameter, ParameterType},
    oauth::{ClientAuthentication, GrantType, OAuthProvider},
};
use zoho_flow_types::{Value, json::{self, json}};

pub const ZOHO_ANALYTICS_PROVIDER_ID: &str = "zohoAnalyticsApiOAuth2Api";
pub const ZOHO_ANALYTICS_TOKEN_CREDENTIALS: &str = "zohoAnalyticsApi";
pub const ZOHO_ANALYTICS_SCOPE: &str = "ZohoAnalytics.fullaccess.all";

const ZOHO_CLIENT_ID: Option<&str> = option_env!("ZOHO_CLIENT_ID");
const ZOHO_CLIENT_SECRET: Option<&str> = option_env!("ZOHO_CLIENT_SECRET");

/// Regional Zoho data centre.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Country {
    Australia,
    China,
    #[default]
    Europe,
    India,
    Japan,
    UnitedStates,
}

/// Top-level domain suffix for each region.
const DOMAINS: [(Country, &str, &str); 6] = [
    (Country::Australia, "au", "com.au"),
    (Country::China, "cn", "com.cn"),
    (Country::Europe, "eu", "eu"),
    (Country::India, "in", "in"),
    (Country::Japan, "jp", "jp"),
    (Country::UnitedStates, "us", "com"),
];

impl Country {
    pub const ALL: [Country; 6] = [
        Country::Australia,
        Country::China,
        Country::Europe,
        Country::India,
        Country::Japan,
        Country::UnitedStates,
    ];

    pub fn code(self) -> &'static str {
        Self::entry(self).1
    }

    pub fn domain(self) -> &'static str {
        Self::entry(self).2
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Country::Australia => "Australia",
            Country::China => "China",
            Country::Europe => "Europe",
            Country::India => "India",
            Country::Japan => "Japan",
            Country::UnitedStates => "United States",
        }
    }

    fn entry(country: Country) -> (Country, &'static str, &'static str) {
        DOMAINS
            .iter()
            .copied()
            .find(|(c, _, _)| *c == country)
            .unwrap_or(DOMAINS[2])
    }
}

impl Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Country {
    type Err = String;

    /// Accepts the short code (`us`) or the domain suffix (`com`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        DOMAINS
            .iter()
            .find(|(_, code, domain)| *code == needle || *domain == needle)
            .map(|(country, _, _)| *country)
            .ok_or_else(|| format!("Unknown Zoho region: {}", s))
    }
}

impl TryFrom<String> for Country {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.code().to_string()
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct ZohoUrls {
    pub auth_url: String,
    pub access_token_url: String,
    pub api_url: String,
}

pub fn derive_urls(country: Country) -> ZohoUrls {
    let domain = country.domain();
    let accounts = format!("https://accounts.zoho.{}", domain);
    ZohoUrls {
        auth_url: format!("{}/oauth/v2/auth", accounts),
        access_token_url: format!("{}/oauth/v2/token", accounts),
        api_url: format!("https://analyticsapi.zoho.{}", domain),
    }
}

/// Stored OAuth2 credential. The host keeps the tokens; the plugin only needs the region.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZohoAnalyticsCredentials {
    #[serde(default)]
    #[schemars(with = "String")]
    pub country: Country,
    /// Overrides the region-derived API URL when set
    #[serde(default)]
    pub api_url: Option<String>,
}

impl ZohoAnalyticsCredentials {
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => derive_urls(self.country).api_url,
        }
    }
}

/// Static token credential used by the bearer-token request variant.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ZohoTokenCredentials {
    /// API base URL, e.g. `https://analyticsapi.zoho.com`
    pub domain: String,
    pub oauth_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl ZohoTokenCredentials {
    pub fn api_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        }
    }
}

/// Region selector shown with the OAuth credential.
pub fn country_field(selected: Country) -> NodeParameter {
    let mut field = NodeParameter::new(
        "country",
        "Region",
        "Zoho data centre that hosts your account",
        ParameterType::Options,
    );
    field
        .set_options(
            Country::ALL
                .iter()
                .map(|country| NodeOption::new(country.display_name(), country.code()))
                .collect(),
        )
        .set_default_value(Some(json!(selected.code())))
        .set_required(true);
    field
}

pub fn oauth_provider(country: Country) -> OAuthProvider {
    let urls = derive_urls(country);
    let mut provider = OAuthProvider::new(ZOHO_ANALYTICS_PROVIDER_ID, "Zoho Analytics")
        .set_auth_url(&urls.auth_url)
        .set_token_url(&urls.access_token_url)
        .add_scope(ZOHO_ANALYTICS_SCOPE)
        .set_grant_type(GrantType::AuthorizationCode)
        .add_auth_query_param("access_type", "offline")
        .set_authentication(ClientAuthentication::Body)
        .set_pkce_required(false)
        .add_field(country_field(country));

    let client_id = ZOHO_CLIENT_ID.unwrap_or_default();
    let client_secret = ZOHO_CLIENT_SECRET.unwrap_or_default();
    if !client_id.is_empty() {
        provider = provider.set_client_id(client_id);
    }
    if !client_secret.is_empty() {
        provider = provider.set_client_secret(client_secret);
    }

    provider.build()
}

/// Builds the provider for the region stored in `credentials`.
/// Returns `None` for other providers or an unknown region.
pub fn resolve_oauth_provider(provider_id: &str, credentials: &Value) -> Option<OAuthProvider> {
    if provider_id != ZOHO_ANALYTICS_PROVIDER_ID {
        return None;
    }
    let credentials: ZohoAnalyticsCredentials = json::from_value(credentials.clone()).ok()?;
    Some(oauth_provider(credentials.country))
}
