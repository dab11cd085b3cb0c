use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use bulkstate_core::{GatewayError, TransitionGateway, TransitionRequest};
use bulkstate_gateway::{OptionEntry, TransitionCatalog};
use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::webapi;

#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub api_version: String,
    /// Bearer token; acquiring it is the caller's business.
    pub token: String,
    pub timeout: Duration,
}

/// Gateway over the Web API. Entity-set names are resolved once per entity
/// and kept for the life of the gateway.
pub struct HttpGateway {
    client: Client,
    root: String,
    token: String,
    entity_sets: Mutex<HashMap<String, String>>,
}

impl HttpGateway {
    pub fn new(cfg: HttpGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            root: webapi::api_root(&cfg.base_url, &cfg.api_version),
            token: cfg.token,
            entity_sets: Mutex::new(HashMap::new()),
        })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.token)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
    }

    fn get_text(&self, url: &str) -> Result<String, GatewayError> {
        debug!(%url, "GET");
        let resp = self
            .authed(self.client.get(url))
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        read_success(resp)
    }

    fn entity_set(&self, entity: &str) -> Result<String, GatewayError> {
        if let Some(set) = self.entity_sets.lock().unwrap_or_else(|p| p.into_inner()).get(entity) {
            return Ok(set.clone());
        }
        let body = self.get_text(&webapi::entity_set_url(&self.root, entity))?;
        let set = webapi::parse_entity_set(&body).map_err(|e| GatewayError::Rejected(format!("{:#}", e)))?;
        self.entity_sets
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(entity.to_string(), set.clone());
        Ok(set)
    }

    fn metadata(&self, url: &str) -> Result<String> {
        self.get_text(url).map_err(|e| anyhow!("metadata request failed: {}", e))
    }
}

fn read_success(resp: Response) -> Result<String, GatewayError> {
    let status = resp.status();
    let body = resp.text().map_err(|e| GatewayError::Transport(e.to_string()))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(GatewayError::Rejected(webapi::error_message(status.as_u16(), &body)))
    }
}

impl TransitionGateway for HttpGateway {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError> {
        webapi::check_logical_name(request.entity()).map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let guid = request
            .record_id()
            .as_uuid()
            .ok_or_else(|| GatewayError::Rejected(format!("record id is not a GUID: {}", request.record_id())))?;
        let set = self.entity_set(request.entity())?;
        let url = webapi::record_url(&self.root, &set, &guid.hyphenated().to_string());
        debug!(%url, "PATCH");
        let resp = self
            .authed(self.client.patch(&url))
            // update only; never create a record that does not exist
            .header("If-Match", "*")
            .json(&webapi::transition_body(request.transition()))
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        read_success(resp).map(|_| ())
    }
}

impl TransitionCatalog for HttpGateway {
    fn entities(&self) -> Result<Vec<String>> {
        let body = self.metadata(&webapi::entities_url(&self.root))?;
        webapi::parse_entity_names(&body)
    }

    fn state_options(&self, entity: &str) -> Result<Vec<OptionEntry>> {
        webapi::check_logical_name(entity)?;
        let body = self.metadata(&webapi::state_options_url(&self.root, entity))?;
        webapi::parse_state_options(&body)
    }

    fn status_options(&self, entity: &str, state: u32) -> Result<Vec<OptionEntry>> {
        webapi::check_logical_name(entity)?;
        let body = self.metadata(&webapi::status_options_url(&self.root, entity))?;
        Ok(webapi::parse_status_options(&body)?
            .into_iter()
            .filter(|s| s.state == state)
            .map(|s| OptionEntry { value: s.value, label: s.label })
            .collect())
    }
}
