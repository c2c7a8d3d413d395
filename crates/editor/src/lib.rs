//! Headless state of a node graph editor, with automatic layout
//!
//! [`FlowStore`] holds nodes, edges and the viewport. [`AutoLayout`] computes
//! layered positions for a set of nodes and pushes them into the store, either
//! at once or animated over a few frames driven by [`FlowStore::advance`].

pub mod animate;
pub mod comps;
pub mod config;
pub mod error;
pub mod layout;
pub mod ser;
pub mod store;
pub mod viewport;

pub use animate::{Animator, NodeAnimation, RunId, Step};
pub use comps::*;
pub use config::{FlowConfig, LayoutOptions, ViewportOptions};
pub use error::{Error, Result};
pub use layout::{AutoLayout, LayoutCompletion};
pub use ser::{load_document, save_document, FlowDocument};
pub use store::{rect_of_nodes, FlowStore};
pub use viewport::{transform_for_bounds, Viewport};

pub use flowkit_graph_layout::RankDir;
