use crate::NodeId;
use flowkit_graph_layout::LayeredLayoutError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no node with id {0}")]
    UnknownNode(NodeId),

    #[error("a node with id {0} already exists")]
    DuplicateNode(NodeId),

    #[error("entity was despawned while in use")]
    Despawned(#[from] hecs::NoSuchEntity),

    #[error(transparent)]
    Layout(#[from] LayeredLayoutError<hecs::Entity>),

    #[error("the store was dropped before the layout finished")]
    Abandoned,

    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize")]
    Serialize(#[from] ron::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
