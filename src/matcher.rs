//! Route matching.
//!
//! Decides which route records are documented and under which rule-set. Each
//! configured rule group is evaluated independently: exclusion globs always
//! win, explicit includes bypass domain/prefix/version matching, and a route
//! matched by several groups is documented once per group (downstream
//! grouping absorbs the duplicates).

use crate::config::{RouteGroupConfig, RuleSet};
use crate::route::RouteRecord;
use glob::Pattern;
use log::debug;

/// Prefix identifying the tool's own documentation routes, which are never
/// documented themselves.
const INTERNAL_PREFIX: &str = "apidoc";

/// A route paired with the rule-set of the group that matched it.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: RouteRecord,
    pub rules: RuleSet,
}

/// Selects documentable routes according to the configured rule groups.
pub struct RouteMatcher {
    groups: Vec<RouteGroupConfig>,
}

impl RouteMatcher {
    pub fn new(groups: Vec<RouteGroupConfig>) -> Self {
        Self { groups }
    }

    /// Produces the ordered `{route, rule-set}` pairs to document.
    ///
    /// Groups are evaluated in configuration order; within a group, routes
    /// keep their input order.
    pub fn match_routes(&self, routes: &[RouteRecord]) -> Vec<MatchedRoute> {
        let mut matched = Vec::new();
        for group in &self.groups {
            for route in routes {
                if self.route_matches_group(route, group) {
                    matched.push(MatchedRoute {
                        route: route.clone(),
                        rules: group.apply.clone(),
                    });
                }
            }
        }
        debug!("Matched {} route/rule-set pairs", matched.len());
        matched
    }

    fn route_matches_group(&self, route: &RouteRecord, group: &RouteGroupConfig) -> bool {
        if is_internal_route(route) {
            return false;
        }
        // Exclusion always wins
        if matches_any_name_or_uri(route, &group.exclude) {
            return false;
        }
        // Explicit include bypasses domain/prefix/version matching
        if matches_any_name_or_uri(route, &group.include) {
            return true;
        }

        let domain = route.domain.as_deref().unwrap_or("");
        if !group.matches.domains.iter().any(|p| glob_matches(p, domain)) {
            return false;
        }
        if !group.matches.prefixes.iter().any(|p| glob_matches(p, &route.uri)) {
            return false;
        }
        if !group.matches.versions.is_empty() {
            let intersects = route.versions.iter().any(|version| {
                group.matches.versions.iter().any(|p| glob_matches(p, version))
            });
            if !intersects {
                return false;
            }
        }
        true
    }
}

fn is_internal_route(route: &RouteRecord) -> bool {
    route.name.starts_with(INTERNAL_PREFIX) || route.uri.starts_with(INTERNAL_PREFIX)
}

fn matches_any_name_or_uri(route: &RouteRecord, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| glob_matches(p, &route.name) || glob_matches(p, &route.uri))
}

fn glob_matches(pattern: &str, value: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}
