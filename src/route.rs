//! Route records and handler metadata.
//!
//! The extraction pipeline never inspects a framework's routing table or
//! performs reflection itself. An out-of-scope framework adapter exports the
//! routes as JSON: each record carries the HTTP methods, URI template, domain,
//! declared name, and a pre-resolved description of the handler (its
//! documentation comments and declared parameter types). This module defines
//! that input shape and loads it from disk.

use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Immutable descriptor of one documentable endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRecord {
    /// HTTP methods; `HEAD` is carried but excluded from display
    pub methods: Vec<String>,
    /// URI template with `{name}` or `{name?}` placeholders
    pub uri: String,
    /// Domain pattern the route is bound to, if any
    #[serde(default)]
    pub domain: Option<String>,
    /// Declared route name used by include/exclude matching
    #[serde(default)]
    pub name: String,
    /// API versions the route belongs to, when versioned routing is in use
    #[serde(default)]
    pub versions: Vec<String>,
    /// Pre-resolved handler metadata
    pub handler: HandlerMeta,
}

/// Pre-resolved metadata about a route's handler.
///
/// Supplied by the framework adapter; the pipeline only reads it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerMeta {
    pub class_name: String,
    pub method_name: String,
    /// Raw documentation comment on the handler class
    #[serde(default)]
    pub class_doc: Option<String>,
    /// Raw documentation comment on the handler method
    #[serde(default)]
    pub method_doc: Option<String>,
    /// Declared handler parameters, in signature order
    #[serde(default)]
    pub parameters: Vec<HandlerParam>,
}

/// One declared parameter of a handler method.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerParam {
    pub name: String,
    /// The declared type name, when the adapter could resolve one
    #[serde(default)]
    pub declared_type: Option<String>,
}

impl RouteRecord {
    /// Methods shown in documentation (`HEAD` stripped).
    pub fn display_methods(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|m| !m.eq_ignore_ascii_case("HEAD"))
            .map(|m| m.to_ascii_uppercase())
            .collect()
    }

    /// The method used when building a synthetic request for this route.
    pub fn main_method(&self) -> String {
        self.display_methods()
            .into_iter()
            .next()
            .unwrap_or_else(|| "GET".to_string())
    }

    /// Human-readable identity used in logs and error messages.
    pub fn signature(&self) -> String {
        format!("{} {}", self.display_methods().join("|"), self.uri)
    }

    /// Stable identifier over the URI and method set.
    ///
    /// FNV-1a over `uri` plus the sorted methods; stable across runs and
    /// releases, unlike the std hasher.
    pub fn stable_id(&self) -> String {
        let mut methods = self.display_methods();
        methods.sort();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in self.uri.bytes().chain(methods.join(",").bytes()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        format!("{:016x}", hash)
    }

    /// Names of the `{placeholder}` segments in the URI, `?` suffix stripped.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = self.uri.as_str();
        while let Some(start) = rest.find('{') {
            match rest[start..].find('}') {
                Some(offset) => {
                    let name = &rest[start + 1..start + offset];
                    names.push(name.trim_end_matches('?').to_string());
                    rest = &rest[start + offset + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// URI with every placeholder substituted.
    ///
    /// Configured bindings win; unbound placeholders (optional or not)
    /// default to the literal `1`.
    pub fn bound_uri(&self, rules: &crate::config::ResponseCallRules) -> String {
        let mut bound = self.uri.clone();
        for name in self.placeholders() {
            let value = rules.binding_for(&name).unwrap_or("1");
            bound = bound
                .replace(&format!("{{{}?}}", name), value)
                .replace(&format!("{{{}}}", name), value);
        }
        bound
    }

    /// Fails when the handler wiring is broken (missing class or method).
    ///
    /// This is the one per-route hard error: it signals a structural
    /// inconsistency the operator must fix, so it is surfaced instead of
    /// silently skipped.
    pub fn verify_handler(&self) -> Result<()> {
        if self.handler.class_name.trim().is_empty() || self.handler.method_name.trim().is_empty()
        {
            return Err(Error::HandlerResolution {
                route: self.signature(),
                message: "handler class or method is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads route records from a JSON file exported by the framework adapter.
pub fn load_routes(path: &Path) -> Result<Vec<RouteRecord>> {
    debug!("Loading routes from {}", path.display());
    let content = fs::read_to_string(path)?;
    let routes: Vec<RouteRecord> = serde_json::from_str(&content).map_err(|e| Error::Config {
        file: path.to_path_buf(),
        message: format!("invalid routes file: {}", e),
    })?;
    debug!("Loaded {} route records", routes.len());
    Ok(routes)
}
