use std::fs;
use std::path::{Path, PathBuf};

use hashnet_common::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builder::GraphSet;
use crate::model::{GraphKind, NodeKind, SocialGraph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    pub kind: NodeKind,
    /// In-degree plus out-degree.
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Serializable snapshot of one graph. Nodes are sorted by id and edges by
/// `(source, target)`, so identical graphs always produce identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub kind: GraphKind,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

impl GraphExport {
    pub fn from_graph(graph: &SocialGraph) -> Self {
        let inner = graph.inner();
        let mut nodes: Vec<ExportNode> = inner
            .node_indices()
            .map(|ix| ExportNode {
                id: inner[ix].id.clone(),
                kind: inner[ix].kind,
                degree: graph.degree(ix),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<ExportEdge> = graph
            .edges()
            .map(|(source, target, weight)| ExportEdge {
                source: source.to_string(),
                target: target.to_string(),
                weight,
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        Self {
            kind: graph.kind(),
            nodes,
            edges,
        }
    }

    pub fn file_name(kind: GraphKind) -> String {
        format!("{}_graph.json", kind.slug())
    }

    /// Pretty-printed JSON at `path`, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)?;
        info!(
            path = %path.display(),
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph.export.written"
        );
        Ok(())
    }
}

/// Write all three graphs under `dir` and return the written paths.
pub fn export_all(set: &GraphSet, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(3);
    for graph in set.iter() {
        let path = dir.join(GraphExport::file_name(graph.kind()));
        GraphExport::from_graph(graph).write_json(&path)?;
        written.push(path);
    }
    Ok(written)
}
