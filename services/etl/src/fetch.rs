//! COVID-19 API client.
//!
//! Failures never reach the caller: network errors, non-2xx statuses and
//! undecodable bodies are logged and collapse to an empty JSON array.

use crate::error::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct CovidApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CovidApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("covid-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, resource_path: &str) -> String {
        let resource_path = resource_path.trim_matches('/');
        if resource_path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, resource_path)
        }
    }

    /// GET `base_url[/resource_path]` with query parameters
    pub async fn get_data(&self, query_params: &[(&str, &str)], resource_path: &str) -> Value {
        match self.try_get(query_params, resource_path).await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to fetch data from API");
                Value::Array(Vec::new())
            }
        }
    }

    async fn try_get(&self, query_params: &[(&str, &str)], resource_path: &str) -> Result<Value> {
        let url = self.url(resource_path);
        info!(%url, "Fetching");

        let mut request = self.client.get(&url).query(query_params);
        if let Some(token) = &self.token {
            request = request.header(API_KEY_HEADER, token);
        }

        let body = request.send().await?.error_for_status()?.json::<Value>().await?;
        Ok(body)
    }
}

/// True when a payload carries nothing to normalize
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}
