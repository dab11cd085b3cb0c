//! URL shapes and payload decoding for the Web API. No I/O here.

use anyhow::{anyhow, Context, Result};
use bulkstate_core::TargetTransition;
use bulkstate_gateway::{OptionEntry, StatusOption};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_root(base_url: &str, api_version: &str) -> String {
    format!("{}/api/data/{}", base_url.trim_end_matches('/'), api_version)
}

/// Logical names are lowercase identifiers; anything else is refused before it
/// is spliced into a URL.
pub fn check_logical_name(name: &str) -> Result<()> {
    let ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !ok {
        return Err(anyhow!("invalid entity logical name: {:?}", name));
    }
    Ok(())
}

pub fn entity_set_url(root: &str, entity: &str) -> String {
    format!("{}/EntityDefinitions(LogicalName='{}')?$select=EntitySetName", root, entity)
}

pub fn entities_url(root: &str) -> String {
    format!("{}/EntityDefinitions?$select=LogicalName", root)
}

pub fn state_options_url(root: &str, entity: &str) -> String {
    format!(
        "{}/EntityDefinitions(LogicalName='{}')/Attributes(LogicalName='statecode')/Microsoft.Dynamics.CRM.StateAttributeMetadata?$select=LogicalName&$expand=OptionSet($select=Options)",
        root, entity
    )
}

pub fn status_options_url(root: &str, entity: &str) -> String {
    format!(
        "{}/EntityDefinitions(LogicalName='{}')/Attributes(LogicalName='statuscode')/Microsoft.Dynamics.CRM.StatusAttributeMetadata?$select=LogicalName&$expand=OptionSet($select=Options)",
        root, entity
    )
}

pub fn record_url(root: &str, entity_set: &str, guid: &str) -> String {
    format!("{}/{}({})", root, entity_set, guid)
}

pub fn transition_body(transition: TargetTransition) -> Value {
    json!({ "statecode": transition.state, "statuscode": transition.status })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Service error text for a failed response, falling back to the status line.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.code {
            Some(code) if !code.is_empty() => format!("{} ({})", env.error.message, code),
            _ => env.error.message,
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntitySetBody {
    entity_set_name: String,
}

pub fn parse_entity_set(body: &str) -> Result<String> {
    let b: EntitySetBody = serde_json::from_str(body).context("decode EntitySetName")?;
    Ok(b.entity_set_name)
}

#[derive(Deserialize)]
struct Collection<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntityName {
    logical_name: String,
}

pub fn parse_entity_names(body: &str) -> Result<Vec<String>> {
    let c: Collection<EntityName> = serde_json::from_str(body).context("decode EntityDefinitions")?;
    let mut names: Vec<String> = c.value.into_iter().map(|e| e.logical_name).collect();
    names.sort();
    Ok(names)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeBody {
    option_set: OptionSetBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OptionSetBody {
    options: Vec<OptionBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OptionBody {
    value: i64,
    #[serde(default)]
    state: Option<i64>,
    #[serde(default)]
    label: Option<LabelBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LabelBody {
    #[serde(default)]
    user_localized_label: Option<LocalizedLabel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocalizedLabel {
    label: String,
}

impl OptionBody {
    fn label_text(&self) -> String {
        self.label
            .as_ref()
            .and_then(|l| l.user_localized_label.as_ref())
            .map(|l| l.label.clone())
            .unwrap_or_default()
    }
}

fn parse_option_bodies(body: &str) -> Result<Vec<OptionBody>> {
    let a: AttributeBody = serde_json::from_str(body).context("decode OptionSet")?;
    Ok(a.option_set.options)
}

/// Negative option values cannot be targeted and are dropped.
pub fn parse_state_options(body: &str) -> Result<Vec<OptionEntry>> {
    Ok(parse_option_bodies(body)?
        .into_iter()
        .filter_map(|o| {
            let value = u32::try_from(o.value).ok()?;
            Some(OptionEntry { value, label: o.label_text() })
        })
        .collect())
}

pub fn parse_status_options(body: &str) -> Result<Vec<StatusOption>> {
    Ok(parse_option_bodies(body)?
        .into_iter()
        .filter_map(|o| {
            let value = u32::try_from(o.value).ok()?;
            let state = u32::try_from(o.state?).ok()?;
            Some(StatusOption { state, value, label: o.label_text() })
        })
        .collect())
}
