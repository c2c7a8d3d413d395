use crate::comps::*;
use crate::{Error, FlowConfig, FlowStore, Result};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Nodes and edges of a graph as stored on disk
///
/// Viewport, animations and layout state are not part of it, the
/// application rebuilds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowDocument {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }
}

pub fn load_document(path: impl AsRef<Path>) -> Result<FlowDocument> {
    let path = path.as_ref();
    info!("Loading document from {path:?}");

    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FlowDocument::from_ron(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_document(document: &FlowDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    info!(
        "Saving {} nodes and {} edges to {path:?}",
        document.nodes.len(),
        document.edges.len()
    );

    std::fs::write(path, document.to_ron()?).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl FlowStore {
    pub fn from_document(document: FlowDocument, config: &FlowConfig) -> Result<Self> {
        let mut store = FlowStore::new(config);
        for node in document.nodes {
            store.add_node(node)?;
        }
        for edge in document.edges {
            store.add_edge(edge)?;
        }
        Ok(store)
    }

    pub fn to_document(&self) -> FlowDocument {
        FlowDocument {
            nodes: self
                .nodes()
                .into_iter()
                .map(|node| NodeSpec {
                    id: node.id,
                    dimensions: node.dimensions,
                    position: node.position,
                    handles: Some(node.handles),
                })
                .collect(),
            edges: self.edges(),
        }
    }
}
