//! Configuration tree.
//!
//! Loaded from a YAML file. `routes` holds ordered match-rule groups, each
//! pairing match/include/exclude rules with the [`RuleSet`] applied to every
//! route the group matches. Top-level `strategies` overrides the built-in
//! per-stage strategy order; a group's `apply.strategies` overrides it again
//! for that group's routes. Unknown strategy names fail at startup when the
//! registry resolves them, before any route is processed.

use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Root configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    /// Group name used when a route declares no `@group`
    #[serde(default = "default_group")]
    pub default_group: String,
    /// Seed for the sample-value generator; fixed default keeps snapshots
    /// reproducible when the config omits it
    #[serde(default = "default_seed")]
    pub faker_seed: u64,
    /// Per-stage strategy-order overrides
    #[serde(default)]
    pub strategies: StrategyOverrides,
    /// Ordered match-rule groups
    #[serde(default)]
    pub routes: Vec<RouteGroupConfig>,
}

fn default_group() -> String {
    "General".to_string()
}

fn default_seed() -> u64 {
    1234
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            default_group: default_group(),
            faker_seed: default_seed(),
            strategies: StrategyOverrides::default(),
            routes: Vec::new(),
        }
    }
}

/// Optional ordered strategy-name lists, one per stage.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StrategyOverrides {
    #[serde(default)]
    pub metadata: Option<Vec<String>>,
    #[serde(default)]
    pub url_parameters: Option<Vec<String>>,
    #[serde(default)]
    pub query_parameters: Option<Vec<String>>,
    #[serde(default)]
    pub body_parameters: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<Vec<String>>,
    #[serde(default)]
    pub responses: Option<Vec<String>>,
}

/// One match-rule group: which routes it selects and what to apply to them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteGroupConfig {
    #[serde(rename = "match", default)]
    pub matches: MatchRules,
    /// Name/URI globs included verbatim, bypassing domain/prefix matching
    #[serde(default)]
    pub include: Vec<String>,
    /// Name/URI globs excluded unconditionally; exclusion always wins
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub apply: RuleSet,
}

/// Declarative domain/prefix/version matching for a rule group.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRules {
    #[serde(default = "default_star")]
    pub domains: Vec<String>,
    #[serde(default = "default_star")]
    pub prefixes: Vec<String>,
    /// Empty means versioned routing is not in use
    #[serde(default)]
    pub versions: Vec<String>,
}

fn default_star() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            domains: default_star(),
            prefixes: default_star(),
            versions: Vec::new(),
        }
    }
}

/// Configuration applied to every route a group matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Extra headers documented (and sent on live calls) for matched routes
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub response_calls: ResponseCallRules,
    /// Per-group strategy override, on top of the top-level one
    #[serde(default)]
    pub strategies: StrategyOverrides,
}

/// Settings for synthesized live response calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseCallRules {
    /// HTTP methods allowed to be called; `*` allows all, empty allows none
    #[serde(default)]
    pub methods: Vec<String>,
    /// Path-placeholder bindings, keyed `{id}` or plain `id`
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
    /// Environment-variable overrides scoped to the call (restored best-effort)
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Config overrides scoped to the call (restoration required)
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Extra query values; override generated ones on conflict
    #[serde(default)]
    pub query: BTreeMap<String, Value>,
    /// Extra body values; override generated ones on conflict
    #[serde(default)]
    pub body: BTreeMap<String, Value>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl ResponseCallRules {
    /// Whether synthesized calls are allowed for the given HTTP method.
    pub fn allows_method(&self, method: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m == "*" || m.eq_ignore_ascii_case(method))
    }

    /// Binding for a path placeholder, accepting both `{id}` and `id` keys.
    pub fn binding_for(&self, placeholder: &str) -> Option<&str> {
        let braced = format!("{{{}}}", placeholder);
        self.bindings
            .get(&braced)
            .or_else(|| self.bindings.get(placeholder))
            .map(String::as_str)
    }
}

impl DocsConfig {
    /// Loads and parses the YAML configuration file.
    ///
    /// Parse errors are configuration errors: they fail the run before any
    /// route is processed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: DocsConfig = serde_yaml::from_str(&content).map_err(|e| Error::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// The effective rule groups: a single match-everything group when the
    /// config declares none.
    pub fn effective_routes(&self) -> Vec<RouteGroupConfig> {
        if self.routes.is_empty() {
            vec![RouteGroupConfig::default()]
        } else {
            self.routes.clone()
        }
    }

    /// The effective per-stage strategy override for a group, preferring the
    /// group's own `apply.strategies` entries over the top-level ones.
    pub fn stage_override<'a>(
        &'a self,
        rules: &'a RuleSet,
        pick: impl Fn(&'a StrategyOverrides) -> &'a Option<Vec<String>>,
    ) -> Option<&'a [String]> {
        pick(&rules.strategies)
            .as_deref()
            .or_else(|| pick(&self.strategies).as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("apidoc.yaml");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(content.as_bytes()).expect("write");
        (dir, path)
    }

    #[test]
    fn test_load_minimal_config() {
        let (_dir, path) = write_config("default_group: Endpoints\n");
        let config = DocsConfig::load(&path).expect("load");
        assert_eq!(config.default_group, "Endpoints");
        assert_eq!(config.faker_seed, 1234);
        assert_eq!(config.effective_routes().len(), 1);
    }

    #[test]
    fn test_load_full_group() {
        let yaml = r#"
routes:
  - match:
      domains: ["api.*"]
      prefixes: ["api/*"]
    exclude: ["internal/*"]
    apply:
      headers:
        Authorization: "Bearer {token}"
      response_calls:
        methods: ["GET"]
        bindings:
          "{id}": "1"
"#;
        let (_dir, path) = write_config(yaml);
        let config = DocsConfig::load(&path).expect("load");
        let group = &config.routes[0];
        assert_eq!(group.matches.domains, vec!["api.*"]);
        assert_eq!(group.apply.headers["Authorization"], "Bearer {token}");
        assert!(group.apply.response_calls.allows_method("get"));
        assert!(!group.apply.response_calls.allows_method("POST"));
        assert_eq!(group.apply.response_calls.binding_for("id"), Some("1"));
    }

    #[test]
    fn test_wildcard_method_allows_everything() {
        let rules = ResponseCallRules {
            methods: vec!["*".to_string()],
            ..ResponseCallRules::default()
        };
        assert!(rules.allows_method("DELETE"));
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let (_dir, path) = write_config("routes: {not: [a, list}\n");
        let err = DocsConfig::load(&path).expect_err("should fail");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let (_dir, path) = write_config("defualt_group: typo\n");
        assert!(DocsConfig::load(&path).is_err());
    }

    #[test]
    fn test_group_strategy_override_beats_top_level() {
        let yaml = r#"
strategies:
  responses: ["responses.doc_block"]
routes:
  - apply:
      strategies:
        responses: ["responses.file"]
  - {}
"#;
        let (_dir, path) = write_config(yaml);
        let config = DocsConfig::load(&path).expect("load");
        let first = config
            .stage_override(&config.routes[0].apply, |s| &s.responses)
            .expect("override");
        assert_eq!(first, ["responses.file".to_string()]);
        let second = config
            .stage_override(&config.routes[1].apply, |s| &s.responses)
            .expect("override");
        assert_eq!(second, ["responses.doc_block".to_string()]);
    }
}
