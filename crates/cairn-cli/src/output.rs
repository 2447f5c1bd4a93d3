//! Output formatting utilities

use serde::Serialize;

use cairn_core::{GraphStore, Vertex, VertexId};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Read the vertices behind `ids`, keeping order
pub fn load_vertices<S: GraphStore + ?Sized>(store: &S, ids: &[VertexId]) -> anyhow::Result<Vec<Vertex>> {
    let mut vertices = Vec::with_capacity(ids.len());
    for id in ids {
        match store.vertex(*id)? {
            Some(v) => vertices.push(v),
            None => tracing::warn!("Vertex {} vanished while printing", id),
        }
    }
    Ok(vertices)
}

/// One line per vertex: id, node-type, sorted properties
pub fn vertex_table(vertices: &[Vertex]) -> String {
    let mut out = String::new();
    for v in vertices {
        let mut props: Vec<String> = v
            .properties
            .iter()
            .map(|(k, val)| match val {
                serde_json::Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect();
        props.sort();
        out.push_str(&format!("{:>6}  {:<20} {}\n", v.id, v.node_type, props.join(" ")));
    }
    out
}

pub fn print_vertices(vertices: &[Vertex], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(&vertices)?),
        OutputFormat::Table => {
            if vertices.is_empty() {
                println!("(no vertices)");
            } else {
                print!("{}", vertex_table(vertices));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Table);
    }

    #[test]
    fn test_vertex_table() {
        let v = Vertex::new(VertexId(3), "pserver")
            .with_property("hostname", "h1")
            .with_property("number-of-cpus", 8);
        let table = vertex_table(&[v]);
        assert!(table.contains("pserver"));
        assert!(table.contains("hostname=h1 number-of-cpus=8"));
    }
}
