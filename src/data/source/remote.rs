use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};

use super::file::documents_from_json;
use super::RecordSource;
use crate::config::DocumentApiConfig;
use crate::data::model::{RawRecord, ROW_ID_FIELD};
use crate::error::SourceError;

/// A remote document collection behind an HTTP document API.
///
/// Issues one `find` with an empty filter and the row id projected away,
/// and reads the `documents` array of the response.
pub struct DocumentApiSource {
    agent: Arc<ureq::Agent>,
    endpoint: String,
    api_key: String,
    body: JsonValue,
}

impl DocumentApiSource {
    /// The API key is read from the environment variable named in `config`.
    pub fn new(config: &DocumentApiConfig, timeout: Duration) -> Result<Self, SourceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| SourceError::Request {
            url: config.url.clone(),
            reason: format!("environment variable {} is not set", config.api_key_env),
        })?;

        Ok(Self {
            agent: Arc::new(ureq::AgentBuilder::new().timeout(timeout).build()),
            endpoint: format!("{}/action/find", config.url.trim_end_matches('/')),
            api_key,
            body: find_request(config),
        })
    }
}

fn find_request(config: &DocumentApiConfig) -> JsonValue {
    json!({
        "dataSource": config.data_source,
        "database": config.database,
        "collection": config.collection,
        "filter": {},
        "projection": { ROW_ID_FIELD: 0 },
    })
}

impl RecordSource for DocumentApiSource {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let request_err = |reason: String| SourceError::Request {
            url: self.endpoint.clone(),
            reason,
        };

        log::debug!("POST {}", self.endpoint);
        let response = self
            .agent
            .post(&self.endpoint)
            .set("api-key", &self.api_key)
            .set("Accept", "application/json")
            .send_json(&self.body)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    request_err(format!("HTTP {code} {}", resp.status_text()))
                }
                ureq::Error::Transport(t) => request_err(t.to_string()),
            })?;

        let payload: JsonValue = response.into_json().map_err(|e| SourceError::Decode {
            origin: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        documents_from_json(payload, &self.endpoint)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
