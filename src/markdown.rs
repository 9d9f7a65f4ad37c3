//! Markdown rendering of extracted route docs.
//!
//! One H1 per group, one H2 per endpoint; parameters as tables, example
//! responses as fenced JSON blocks. The output is intentionally plain so an
//! external merge step can preserve manual edits between runs.

use crate::extractor::RouteDoc;
use crate::params::ParameterSpec;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders all route docs into a single Markdown document.
pub fn render_markdown(docs: &[RouteDoc]) -> String {
    let mut out = String::new();
    let mut seen_groups: Vec<&str> = Vec::new();

    for doc in docs {
        let group = doc.metadata.group_name.as_str();
        if !seen_groups.contains(&group) {
            seen_groups.push(group);
            let _ = writeln!(out, "# {}\n", group);
            if !doc.metadata.group_description.is_empty() {
                let _ = writeln!(out, "{}\n", doc.metadata.group_description);
            }
        }
        render_endpoint(&mut out, doc);
    }
    out
}

fn render_endpoint(out: &mut String, doc: &RouteDoc) {
    let title = if doc.metadata.title.is_empty() {
        doc.uri.as_str()
    } else {
        doc.metadata.title.as_str()
    };
    let _ = writeln!(out, "## {}\n", title);

    if doc.metadata.authenticated {
        let _ = writeln!(out, "> Requires authentication\n");
    }
    if !doc.metadata.description.is_empty() {
        let _ = writeln!(out, "{}\n", doc.metadata.description);
    }

    for method in &doc.methods {
        let _ = writeln!(out, "```\n{} {}\n```\n", method, doc.uri);
    }

    render_param_table(out, "URL Parameters", &doc.url_parameters);
    render_param_table(out, "Query Parameters", &doc.query_parameters);
    render_param_table(out, "Body Parameters", &doc.body_parameters);

    for response in &doc.responses {
        let _ = writeln!(out, "> Example response ({}):\n", response.status);
        let _ = writeln!(out, "```json\n{}\n```\n", pretty_json(&response.content));
    }
}

fn render_param_table(out: &mut String, title: &str, params: &BTreeMap<String, ParameterSpec>) {
    if params.is_empty() {
        return;
    }
    let _ = writeln!(out, "#### {}\n", title);
    let _ = writeln!(out, "| Parameter | Type | Required | Description |");
    let _ = writeln!(out, "|-----------|------|----------|-------------|");
    for (name, spec) in params {
        let required = if spec.required { "yes" } else { "no" };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            name, spec.kind, required, spec.description
        );
    }
    let _ = writeln!(out);
}

/// Pretty-prints response content when it is valid JSON; raw text passes
/// through unchanged.
fn pretty_json(content: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| content.to_string()),
        Err(_) => content.to_string(),
    }
}
