//! Postman-style collection output.
//!
//! Builds a machine-importable collection from extracted route docs: one
//! folder per group, one item per route, with query and body parameters
//! carried as annotated key/value entries and example responses attached when
//! extraction produced any.

use crate::extractor::RouteDoc;
use serde::Serialize;
use serde_json::Value;

const SCHEMA_URL: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// A complete collection document.
#[derive(Debug, Serialize)]
pub struct Collection {
    pub info: CollectionInfo,
    pub item: Vec<Folder>,
}

#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(rename = "_postman_id")]
    pub postman_id: String,
    pub schema: String,
}

/// One folder, grouping the items of a documentation group.
#[derive(Debug, Serialize)]
pub struct Folder {
    pub name: String,
    pub description: String,
    pub item: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct Item {
    pub name: String,
    pub request: Request,
    pub response: Vec<ResponseExample>,
}

#[derive(Debug, Serialize)]
pub struct Request {
    pub method: String,
    pub url: RequestUrl,
    pub header: Vec<HeaderEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct RequestUrl {
    pub raw: String,
    pub path: Vec<String>,
    pub query: Vec<QueryEntry>,
}

#[derive(Debug, Serialize)]
pub struct QueryEntry {
    pub key: String,
    pub value: String,
    pub description: String,
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct RequestBody {
    pub mode: String,
    pub urlencoded: Vec<BodyEntry>,
}

#[derive(Debug, Serialize)]
pub struct BodyEntry {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseExample {
    pub name: String,
    pub code: u16,
    pub body: String,
}

/// Builds a collection from extracted route docs, grouped by group name in
/// first-seen order.
pub fn build_collection(name: &str, docs: &[RouteDoc]) -> Collection {
    let mut folders: Vec<Folder> = Vec::new();

    for doc in docs {
        let group = &doc.metadata.group_name;
        let index = match folders.iter().position(|f| &f.name == group) {
            Some(index) => index,
            None => {
                folders.push(Folder {
                    name: group.clone(),
                    description: doc.metadata.group_description.clone(),
                    item: Vec::new(),
                });
                folders.len() - 1
            }
        };
        folders[index].item.push(build_item(doc));
    }

    Collection {
        info: CollectionInfo {
            name: name.to_string(),
            postman_id: pseudo_id(name),
            schema: SCHEMA_URL.to_string(),
        },
        item: folders,
    }
}

fn build_item(doc: &RouteDoc) -> Item {
    let method = doc
        .methods
        .first()
        .cloned()
        .unwrap_or_else(|| "GET".to_string());

    let query: Vec<QueryEntry> = doc
        .query_parameters
        .iter()
        .map(|(name, spec)| QueryEntry {
            key: name.clone(),
            value: spec.value.as_ref().map(value_as_text).unwrap_or_default(),
            description: annotate(&spec.kind, spec.required, &spec.description),
            // Optional parameters start disabled so imports send the minimum
            disabled: !spec.required,
        })
        .collect();

    let body = if doc.body_parameters.is_empty() {
        None
    } else {
        Some(RequestBody {
            mode: "urlencoded".to_string(),
            urlencoded: doc
                .body_parameters
                .iter()
                .map(|(name, spec)| BodyEntry {
                    key: name.clone(),
                    value: spec.value.as_ref().map(value_as_text).unwrap_or_default(),
                    entry_type: "text".to_string(),
                    description: annotate(&spec.kind, spec.required, &spec.description),
                })
                .collect(),
        })
    };

    let title = if doc.metadata.title.is_empty() {
        doc.uri.clone()
    } else {
        doc.metadata.title.clone()
    };

    Item {
        name: title.clone(),
        request: Request {
            method,
            url: RequestUrl {
                raw: doc.bound_uri.clone(),
                path: doc
                    .bound_uri
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                query,
            },
            header: doc
                .headers
                .iter()
                .map(|(key, value)| HeaderEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
            body,
            description: doc.metadata.description.clone(),
        },
        response: doc
            .responses
            .iter()
            .map(|response| ResponseExample {
                name: format!("{} ({})", title, response.status),
                code: response.status,
                body: response.content.clone(),
            })
            .collect(),
    }
}

fn annotate(kind: &str, required: bool, description: &str) -> String {
    let requirement = if required { "required" } else { "optional" };
    if description.is_empty() {
        format!("({}, {})", kind, requirement)
    } else {
        format!("({}, {}) {}", kind, requirement, description)
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deterministic pseudo identifier derived from the collection name.
fn pseudo_id(name: &str) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("{:016x}", hash)
}
