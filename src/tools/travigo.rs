//! Travigo transit API client backing the declared functions.
//!
//! Every request carries `isllm=true` so the API returns its compact,
//! model-oriented representation.

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::info;
use url::Url;

use crate::core::config::TravigoConfig;
use crate::core::errors::{AssistantError, AssistantResult};
use crate::llm::types::FunctionCall;
use crate::tools::{GET_STOP, SEARCH_STOPS, STOP_DEPARTURES, ToolExecutor, ToolFuture};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes model function calls against the Travigo API.
pub struct TravigoTools {
    client: reqwest::Client,
    base_url: Url,
}

impl TravigoTools {
    /// Build a client for the configured API.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &TravigoConfig, timeout: Duration) -> AssistantResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AssistantError::InvalidConfig(format!(
                "travigo base url cannot be a base: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Search stops matching a name and transport type.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn search_stops(&self, name: &str, transport_type: &str) -> AssistantResult<Value> {
        let url = self.search_url(name, transport_type);
        let started = Instant::now();
        let result = self.get_json(url).await?;
        info!(name, transport_type, elapsed = ?started.elapsed(), "stop_search");
        Ok(result)
    }

    /// Detail for one stop.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_stop(&self, primary_identifier: &str) -> AssistantResult<Value> {
        let url = self.stop_url(primary_identifier, None);
        let started = Instant::now();
        let result = self.get_json(url).await?;
        info!(primary_identifier, elapsed = ?started.elapsed(), "get_stop");
        Ok(result)
    }

    /// Upcoming departures for one stop.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn stop_departures(&self, primary_identifier: &str) -> AssistantResult<Value> {
        let url = self.stop_url(primary_identifier, Some("departures"));
        let started = Instant::now();
        let result = self.get_json(url).await?;
        info!(primary_identifier, elapsed = ?started.elapsed(), "stop_departures");
        Ok(result)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut().append_pair("isllm", "true");
        url
    }

    fn search_url(&self, name: &str, transport_type: &str) -> Url {
        let mut url = self.endpoint(&["core", "stops", "search"]);
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("transporttype", transport_type);
        url
    }

    fn stop_url(&self, primary_identifier: &str, suffix: Option<&str>) -> Url {
        let mut segments = vec!["core", "stops", primary_identifier];
        segments.extend(suffix);
        self.endpoint(&segments)
    }

    async fn get_json(&self, url: Url) -> AssistantResult<Value> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Upstream {
                service: "travigo",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

impl ToolExecutor for TravigoTools {
    fn execute<'a>(&'a self, call: &'a FunctionCall) -> ToolFuture<'a, AssistantResult<Value>> {
        Box::pin(async move {
            match call.name.as_str() {
                SEARCH_STOPS => {
                    let name = string_arg(call, "name")?;
                    let transport_type = string_arg(call, "transporttype")?;
                    self.search_stops(name, transport_type).await.map(into_object)
                }
                GET_STOP => {
                    let id = string_arg(call, "primaryidentifier")?;
                    self.get_stop(id).await.map(into_object)
                }
                STOP_DEPARTURES => {
                    let id = string_arg(call, "primaryidentifier")?;
                    let departures = self.stop_departures(id).await?;
                    Ok(json!({ "departures": departures }))
                }
                other => Err(AssistantError::UnknownFunction(other.to_string())),
            }
        })
    }
}

fn string_arg<'a>(call: &'a FunctionCall, key: &str) -> AssistantResult<&'a str> {
    call.args
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AssistantError::InvalidArguments {
            function: call.name.clone(),
            reason: format!("missing string argument `{key}`"),
        })
}

/// Function responses must be JSON objects; anything else is wrapped.
fn into_object(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        json!({ "result": value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(base: &str) -> Option<TravigoTools> {
        let config = TravigoConfig {
            base_url: base.to_string(),
        };
        let tools = TravigoTools::new(&config, Duration::from_secs(5)).ok();
        assert!(tools.is_some(), "client for {base} should build");
        tools
    }

    #[test]
    fn test_new_accepts_http_bases() {
        assert!(tools("https://api.travigo.app").is_some());
        assert!(tools("http://localhost:8080/api/").is_some());
    }

    #[test]
    fn test_search_url() {
        let Some(tools) = tools("https://api.travigo.app") else {
            return;
        };
        let url = tools.search_url("Baldock", "Rail").to_string();
        assert_eq!(
            url,
            "https://api.travigo.app/core/stops/search?isllm=true&name=Baldock&transporttype=Rail"
        );
    }

    #[test]
    fn test_stop_urls_keep_base_path() {
        let Some(tools) = tools("http://localhost:8080/api/") else {
            return;
        };
        assert_eq!(
            tools.stop_url("gb-crs-BDK", None).to_string(),
            "http://localhost:8080/api/core/stops/gb-crs-BDK?isllm=true"
        );
        assert_eq!(
            tools.stop_url("gb-crs-BDK", Some("departures")).to_string(),
            "http://localhost:8080/api/core/stops/gb-crs-BDK/departures?isllm=true"
        );
    }

    #[test]
    fn test_identifier_is_one_segment() {
        let Some(tools) = tools("https://api.travigo.app") else {
            return;
        };
        let url = tools.stop_url("a/b c", None).to_string();
        assert_eq!(url, "https://api.travigo.app/core/stops/a%2Fb%20c?isllm=true");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = TravigoConfig {
            base_url: "mailto:someone@example.com".to_string(),
        };
        assert!(matches!(
            TravigoTools::new(&config, Duration::from_secs(5)),
            Err(AssistantError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_into_object_wraps_arrays() {
        assert_eq!(into_object(json!([1, 2])), json!({"result": [1, 2]}));
        assert_eq!(into_object(json!({"a": 1})), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let Some(tools) = tools("https://api.travigo.app") else {
            return;
        };
        let call = FunctionCall {
            name: "book_ticket".to_string(),
            args: json!({}),
        };
        let result = tools.execute(&call).await;
        assert!(matches!(
            result,
            Err(AssistantError::UnknownFunction(name)) if name == "book_ticket"
        ));
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let Some(tools) = tools("https://api.travigo.app") else {
            return;
        };
        let call = FunctionCall {
            name: GET_STOP.to_string(),
            args: json!({"id": "gb-crs-BDK"}),
        };
        let result = tools.execute(&call).await;
        assert!(matches!(result, Err(AssistantError::InvalidArguments { .. })));
    }
}
