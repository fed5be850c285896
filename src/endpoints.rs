//! Endpoint pool management for `aliaszip endpoints`.
//!
//! Mutations operate on an in-memory [`Config`]; the CLI persists the result
//! with [`crate::config::save_config`].

use anyhow::{bail, Result};

use aliaszip_core::models::{EndpointConfig, EndpointKind};

use crate::config::Config;

/// Fields for a new endpoint.
#[derive(Debug, Clone)]
pub struct NewEndpoint {
    pub kind: EndpointKind,
    pub name: String,
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub use_proxy: bool,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EndpointEdit {
    pub name: Option<String>,
    pub host: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub use_proxy: Option<bool>,
}

pub fn render_endpoint_table(endpoints: &[EndpointConfig]) -> String {
    let mut out = format!(
        "{:<14} {:<12} {:<8} {:<6} {:<7} TARGET\n",
        "ID", "NAME", "KIND", "PROXY", "USABLE"
    );
    for ep in endpoints {
        out.push_str(&format!(
            "{:<14} {:<12} {:<8} {:<6} {:<7} {}/{}/{}\n",
            ep.id,
            ep.name,
            ep.kind.as_str(),
            if ep.use_proxy { "on" } else { "off" },
            ep.is_usable(),
            ep.host,
            ep.owner,
            ep.repo
        ));
    }
    out
}

pub fn list_endpoints(config: &Config) -> Result<()> {
    if config.endpoints.is_empty() {
        println!("No endpoints configured. Add one with `aliaszip endpoints add`.");
        return Ok(());
    }
    print!("{}", render_endpoint_table(&config.endpoints));
    Ok(())
}

/// Append a new endpoint and return its id (Unix milliseconds, bumped past
/// any id already in the pool).
pub fn add_endpoint(config: &mut Config, new: NewEndpoint) -> Result<i64> {
    let mut id = chrono::Utc::now().timestamp_millis();
    while config.endpoints.iter().any(|ep| ep.id == id) {
        id += 1;
    }

    let endpoint = EndpointConfig {
        id,
        kind: new.kind,
        name: new.name.trim().to_string(),
        host: new.host.trim().to_string(),
        owner: new.owner.trim().to_string(),
        repo: new.repo.trim().to_string(),
        use_proxy: new.use_proxy,
    };
    ensure_complete(&endpoint)?;

    tracing::info!(id, name = %endpoint.name, "endpoint added");
    config.endpoints.push(endpoint);
    Ok(id)
}

pub fn edit_endpoint(config: &mut Config, id: i64, edit: EndpointEdit) -> Result<()> {
    let Some(endpoint) = config.endpoints.iter_mut().find(|ep| ep.id == id) else {
        bail!("no endpoint with id {}", id);
    };

    let mut updated = endpoint.clone();
    if let Some(name) = edit.name {
        updated.name = name.trim().to_string();
    }
    if let Some(host) = edit.host {
        updated.host = host.trim().to_string();
    }
    if let Some(owner) = edit.owner {
        updated.owner = owner.trim().to_string();
    }
    if let Some(repo) = edit.repo {
        updated.repo = repo.trim().to_string();
    }
    if let Some(use_proxy) = edit.use_proxy {
        updated.use_proxy = use_proxy;
    }
    ensure_complete(&updated)?;

    *endpoint = updated;
    tracing::info!(id, "endpoint updated");
    Ok(())
}

pub fn remove_endpoint(config: &mut Config, id: i64) -> Result<EndpointConfig> {
    let Some(pos) = config.endpoints.iter().position(|ep| ep.id == id) else {
        bail!("no endpoint with id {}", id);
    };
    let removed = config.endpoints.remove(pos);
    tracing::info!(id, name = %removed.name, "endpoint removed");
    Ok(removed)
}

fn ensure_complete(endpoint: &EndpointConfig) -> Result<()> {
    let missing = endpoint.missing_fields();
    if !missing.is_empty() {
        bail!("endpoint is missing required fields: {}", missing.join(", "));
    }
    Ok(())
}
