//! Editing helpers for JSON model documents.
//!
//! A model document is a JSON object with a `nodes` array, an
//! `edges` array of `[from, to, ..]` arrays, and `parameters` and
//! `recorders` maps. Nodes are objects identified by their `name`;
//! a node with a truthy `placeholder` field only reserves its name
//! and is replaced by the first real definition.
mod demand;

pub use demand::*;

use crate::errors::ModelJsonError;

use serde_json::{json, Map, Value};

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

/// Returns the node called `name`.
///
/// # Examples
/// ```
/// use hydrobin_model::model_json::get_node;
/// use serde_json::json;
///
/// let data = json!({"nodes": [{"name": "river", "type": "catchment"}]});
///
/// assert_eq!(get_node(&data, "river").unwrap()["type"], "catchment");
/// assert!(get_node(&data, "lake").is_err());
/// ```
pub fn get_node<'a>(data: &'a Value, name: &str) -> Result<&'a Value, ModelJsonError> {
    data.get("nodes")
        .and_then(Value::as_array)
        .ok_or(ModelJsonError::MalformedSection {
            section: "nodes",
            expected: "an array",
        })?
        .iter()
        .find(|n| node_name(n) == Some(name))
        .ok_or_else(|| ModelJsonError::NodeNotFound(name.to_string()))
}

/// Adds `node` to the document.
///
/// A placeholder node of the same name is replaced. If a real node
/// of the same name exists, `node`'s fields are merged into it and
/// `false` is returned. Otherwise the node is appended and `true`
/// is returned.
///
/// # Examples
/// ```
/// use hydrobin_model::model_json::add_node;
/// use serde_json::json;
///
/// let mut data = json!({"nodes": [{"name": "town", "placeholder": true}]});
///
/// assert!(add_node(&mut data, json!({"name": "town", "type": "output"})).unwrap());
/// assert!(!add_node(&mut data, json!({"name": "town", "max_flow": 10})).unwrap());
/// assert_eq!(data["nodes"], json!([{"name": "town", "type": "output", "max_flow": 10}]));
/// ```
pub fn add_node(data: &mut Value, node: Value) -> Result<bool, ModelJsonError> {
    let fields = match node {
        Value::Object(fields) => fields,
        _ => return Err(ModelJsonError::MalformedNode),
    };
    let name = fields.get("name").and_then(Value::as_str).map(String::from);
    let nodes = nodes_mut(data)?;
    if let Some(name) = &name {
        if let Some(i) = nodes.iter().position(|n| node_name(n) == Some(name.as_str())) {
            if is_placeholder(&nodes[i]) {
                nodes.remove(i);
            } else {
                merge(&mut nodes[i], fields);
                return Ok(false);
            }
        }
    }
    nodes.push(Value::Object(fields));
    Ok(true)
}

/// Appends an edge to the document.
///
/// # Errors
/// Returns [`ModelJsonError::DuplicateEdge`] if an existing edge
/// agrees with `edge` on all the elements both have.
pub fn add_connection(data: &mut Value, edge: Vec<Value>) -> Result<(), ModelJsonError> {
    let edges = section_mut(data, "edges")?
        .as_array_mut()
        .ok_or(ModelJsonError::MalformedSection {
            section: "edges",
            expected: "an array",
        })?;
    let duplicate = edges
        .iter()
        .filter_map(Value::as_array)
        .any(|existing| existing.iter().zip(&edge).all(|(a, b)| a == b));
    if duplicate {
        return Err(ModelJsonError::DuplicateEdge {
            from: endpoint(edge.get(0)),
            to: endpoint(edge.get(1)),
        });
    }
    edges.push(Value::Array(edge));
    Ok(())
}

/// Merges `fields` into the node called `name`.
pub fn update_node(
    data: &mut Value,
    name: &str,
    fields: Map<String, Value>,
) -> Result<(), ModelJsonError> {
    let node = nodes_mut(data)?
        .iter_mut()
        .find(|n| node_name(n) == Some(name))
        .ok_or_else(|| ModelJsonError::NodeNotFound(name.to_string()))?;
    merge(node, fields);
    Ok(())
}

/// Merges `fields` into the parameter called `name`.
pub fn update_parameter(
    data: &mut Value,
    name: &str,
    fields: Map<String, Value>,
) -> Result<(), ModelJsonError> {
    let parameter = parameters_mut(data)?
        .get_mut(name)
        .ok_or_else(|| ModelJsonError::ParameterNotFound(name.to_string()))?;
    merge(parameter, fields);
    Ok(())
}

/// The document [`join_models`] starts from when given no base.
pub fn model_template() -> Value {
    json!({
        "metadata": {
            "title": "Model template",
            "description": "",
            "minimum_version": "0.2dev0"
        },
        "solver": {"name": "glpk"},
        "timestepper": {
            "start": "1990-01-01",
            "end": "1999-12-31",
            "timestep": 7
        },
        "recorders": {}
    })
}

/// Joins the model files at `paths` into `base`, or into
/// [`model_template`] if `base` is `None`.
///
/// Nodes are added with [`add_node`], skipping placeholders, and
/// edges with [`add_connection`]. Parameters and recorders of later
/// files override earlier ones of the same name.
pub fn join_models<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    base: Option<Value>,
) -> Result<Value, ModelJsonError> {
    let mut data = base.unwrap_or_else(model_template);
    {
        let sections = data.as_object_mut().ok_or(ModelJsonError::MalformedSection {
            section: "model",
            expected: "an object",
        })?;
        sections.entry("nodes").or_insert_with(|| json!([]));
        sections.entry("edges").or_insert_with(|| json!([]));
        sections.entry("parameters").or_insert_with(|| json!({}));
        sections.entry("recorders").or_insert_with(|| json!({}));
    }

    for path in paths {
        let include = read_model(path.as_ref())?;
        if let Some(nodes) = include.get("nodes").and_then(Value::as_array) {
            for node in nodes.iter().filter(|n| n.get("placeholder").is_none()) {
                add_node(&mut data, node.clone())?;
            }
        }
        if let Some(edges) = include.get("edges").and_then(Value::as_array) {
            for edge in edges.iter().filter_map(Value::as_array) {
                add_connection(&mut data, edge.clone())?;
            }
        }
        for section in ["parameters", "recorders"] {
            if let Some(entries) = include.get(section).and_then(Value::as_object) {
                let target = section_mut(&mut data, section)?.as_object_mut().ok_or(
                    ModelJsonError::MalformedSection {
                        section,
                        expected: "an object",
                    },
                )?;
                target.extend(entries.clone());
            }
        }
    }
    Ok(data)
}

/// Rewrites the `url` of every nested object so that the document can
/// be moved next to a `data` directory: absolute paths are re-rooted to
/// `data/<file name>`, and backslashes become forward slashes.
///
/// Only objects nested in objects are searched; arrays are not entered.
/// Returns the set of rewritten urls.
///
/// # Examples
/// ```
/// use hydrobin_model::model_json::fix_external_urls;
/// use serde_json::json;
///
/// let mut data = json!({
///     "tables": {"flows": {"url": "/home/me/inflows.csv"}},
///     "parameters": {"demand": {"url": "tables\\demand.h5"}}
/// });
///
/// let files = fix_external_urls(&mut data);
///
/// assert_eq!(data["tables"]["flows"]["url"], "data/inflows.csv");
/// assert_eq!(data["parameters"]["demand"]["url"], "tables/demand.h5");
/// assert_eq!(files.len(), 2);
/// ```
pub fn fix_external_urls(data: &mut Value) -> BTreeSet<String> {
    let mut external_filenames = BTreeSet::new();
    let mut to_search: VecDeque<&mut Value> = VecDeque::from([data]);
    while let Some(item) = to_search.pop_front() {
        let fields = match item {
            Value::Object(fields) => fields,
            _ => continue,
        };
        if let Some(Value::String(url)) = fields.get_mut("url") {
            let path = Path::new(url.as_str());
            let rerooted = match path.file_name() {
                Some(file_name) if path.is_absolute() => {
                    format!("data/{}", file_name.to_string_lossy())
                }
                _ => url.clone(),
            };
            *url = rerooted.replace('\\', "/");
            external_filenames.insert(url.clone());
        }
        to_search.extend(fields.values_mut().filter(|v| v.is_object()));
    }
    external_filenames
}

fn read_model(path: &Path) -> Result<Value, ModelJsonError> {
    let contents = fs::read_to_string(path).map_err(|source| ModelJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ModelJsonError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn node_name(node: &Value) -> Option<&str> {
    node.get("name").and_then(Value::as_str)
}

fn is_placeholder(node: &Value) -> bool {
    match node.get("placeholder") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    }
}

fn endpoint(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn merge(target: &mut Value, fields: Map<String, Value>) {
    if let Value::Object(existing) = target {
        existing.extend(fields);
    }
}

fn section_mut<'a>(data: &'a mut Value, section: &'static str) -> Result<&'a mut Value, ModelJsonError> {
    data.get_mut(section).ok_or(ModelJsonError::MalformedSection {
        section,
        expected: "present",
    })
}

fn nodes_mut(data: &mut Value) -> Result<&mut Vec<Value>, ModelJsonError> {
    section_mut(data, "nodes")?
        .as_array_mut()
        .ok_or(ModelJsonError::MalformedSection {
            section: "nodes",
            expected: "an array",
        })
}

pub(crate) fn parameters_mut(data: &mut Value) -> Result<&mut Map<String, Value>, ModelJsonError> {
    section_mut(data, "parameters")?
        .as_object_mut()
        .ok_or(ModelJsonError::MalformedSection {
            section: "parameters",
            expected: "an object",
        })
}
