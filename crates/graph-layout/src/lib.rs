//! Layered graph layout
//!
//! This crate computes node positions for directed graphs. It works with any
//! graph implementing petgraph's visitor traits and knows nothing about the
//! editor that displays the result.
//!
//! # Layout Engines
//!
//! - [`LayeredLayout`]: Sugiyama-style layered layout, ranks running left to
//!   right or top to bottom, cycles broken by reversing a feedback arc set
//!
//! # Example
//!
//! ```
//! use flowkit_graph_layout::{LayeredLayout, LayoutEngine, RankDir, Vec2};
//! use petgraph::graphmap::DiGraphMap;
//!
//! let mut graph = DiGraphMap::new();
//! graph.add_edge(1, 2, ());
//! graph.add_edge(2, 3, ());
//!
//! let engine = LayeredLayout::new(Vec2::new(50.0, 50.0)).with_rank_dir(RankDir::TopToBottom);
//! let sizes = |_node: i32| Vec2::new(150.0, 50.0);
//!
//! // Both phases at once
//! let centers = engine.layout(&graph, &sizes).unwrap();
//! assert!(centers[&1].y < centers[&2].y);
//!
//! // Or cache the layers and only recompute the coordinates
//! let layers = engine.compute_layers(&graph).unwrap();
//! let centers = engine.compute_positions(&layers, &sizes);
//! assert_eq!(centers.len(), 3);
//! ```

mod engine;
mod geometry;
mod rank_dir;
mod sizes;

pub mod layered;

pub use engine::LayoutEngine;
pub use geometry::{Point, Vec2};
pub use rank_dir::{ParseRankDirError, RankDir};
pub use sizes::{NodeSizes, Transposed};

pub use petgraph::visit::{GraphBase, IntoNeighborsDirected, IntoNodeIdentifiers};
pub use petgraph::Direction;

pub use layered::{LayeredLayout, LayeredLayoutError, Layers};
