//! Collaborator seams between the extraction core and the host application.
//!
//! The pipeline itself never reflects over live code, talks to storage, or
//! dispatches HTTP. Everything it needs from the surrounding application comes
//! through the traits in this module: validation rules for request types,
//! sample model instances for serializer-derived responses, and the execution
//! environment used by the live-call response strategy. The CLI runs with the
//! inert implementations below; an embedding host supplies real ones.

use anyhow::{bail, Result};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Source of validation-rule declarations for typed request objects.
pub trait RuleSource {
    /// Rules for a declared request type: parameter name to rule-name list
    /// (e.g. `email` → `["required", "email"]`). `None` when the type has no
    /// rule declaration.
    fn rules_for(&self, type_name: &str) -> Option<BTreeMap<String, Vec<String>>>;
}

/// Produces a representative instance of a named model type.
///
/// Implementations should try, in order: a factory-style builder, an existing
/// record fetched from storage, and finally bare construction. The pipeline
/// only sees the resulting JSON value.
pub trait SampleModelProvider {
    fn sample(&self, model_type: &str) -> Result<Value>;
}

/// Runs a model through a named serializer and returns the serialized JSON.
///
/// Covers both transformer-style serializers and resource classes.
pub trait SerializerRegistry {
    fn transform(&self, transformer: &str, model: Value, collection: bool) -> Result<Value>;
    fn render_resource(&self, resource: &str, model: Value, collection: bool) -> Result<Value>;
}

/// A synthetic request built for response synthesis.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRequest {
    pub method: String,
    /// URI with path placeholders already substituted
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

/// What came back from dispatching a synthetic request.
#[derive(Debug, Clone)]
pub struct KernelResponse {
    pub status: u16,
    pub body: String,
}

/// Host-side execution scope for live response calls.
///
/// `begin_transaction` / `rollback_transaction` bracket every synthetic call
/// so side effects never persist; the runner guarantees the rollback on all
/// exit paths. Config overrides must be restored by `restore_overrides`;
/// environment-variable overrides are restored best-effort (remember prior
/// values, reinstate them, remove vars that did not exist).
pub trait ExecutionEnvironment {
    fn begin_transaction(&self) -> Result<()>;
    fn rollback_transaction(&self);
    fn apply_overrides(
        &self,
        config: &BTreeMap<String, String>,
        env: &BTreeMap<String, String>,
    ) -> Result<()>;
    fn restore_overrides(&self);
    /// Dispatches the request through the host HTTP kernel.
    fn dispatch(&self, request: &SyntheticRequest) -> Result<KernelResponse>;
}

/// Rule source backed by a static map, loadable from a JSON file.
///
/// The CLI feeds it the optional rules file exported next to the routes file.
#[derive(Debug, Default)]
pub struct StaticRuleSource {
    rules: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StaticRuleSource {
    pub fn new(rules: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self { rules }
    }

    /// Loads a `type → {param → [rules]}` map from a JSON file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = fs::read_to_string(path)?;
        let rules = serde_json::from_str(&content).map_err(|e| crate::error::Error::Config {
            file: path.to_path_buf(),
            message: format!("invalid rules file: {}", e),
        })?;
        Ok(Self { rules })
    }
}

impl RuleSource for StaticRuleSource {
    fn rules_for(&self, type_name: &str) -> Option<BTreeMap<String, Vec<String>>> {
        self.rules.get(type_name).cloned()
    }
}

/// Inert model provider used when no host application is attached.
#[derive(Debug, Default)]
pub struct NullModelProvider;

impl SampleModelProvider for NullModelProvider {
    fn sample(&self, model_type: &str) -> Result<Value> {
        bail!("no sample model provider configured (requested model '{}')", model_type)
    }
}

/// Inert serializer registry used when no host application is attached.
#[derive(Debug, Default)]
pub struct NullSerializerRegistry;

impl SerializerRegistry for NullSerializerRegistry {
    fn transform(&self, transformer: &str, _model: Value, _collection: bool) -> Result<Value> {
        bail!("no serializer registry configured (requested transformer '{}')", transformer)
    }

    fn render_resource(&self, resource: &str, _model: Value, _collection: bool) -> Result<Value> {
        bail!("no serializer registry configured (requested resource '{}')", resource)
    }
}

/// Inert execution environment: transactions are no-ops and dispatch declines.
///
/// With this environment the live-call strategy reports the failure and
/// contributes no response, which is the correct standalone-CLI behavior.
#[derive(Debug, Default)]
pub struct NullEnvironment;

impl ExecutionEnvironment for NullEnvironment {
    fn begin_transaction(&self) -> Result<()> {
        debug!("NullEnvironment: begin_transaction (no-op)");
        Ok(())
    }

    fn rollback_transaction(&self) {
        debug!("NullEnvironment: rollback_transaction (no-op)");
    }

    fn apply_overrides(
        &self,
        _config: &BTreeMap<String, String>,
        _env: &BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(())
    }

    fn restore_overrides(&self) {}

    fn dispatch(&self, request: &SyntheticRequest) -> Result<KernelResponse> {
        bail!(
            "no execution environment configured, cannot call {} {}",
            request.method,
            request.uri
        )
    }
}
