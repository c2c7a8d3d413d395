use derive_more::{Display, From};
use egui::{Pos2, Vec2};
use flowkit_graph_layout::RankDir;
use serde::{Deserialize, Serialize};

// Nodes and edges live as entities in the store's world. A node entity
// carries NodeId, Position and Handles, and Dimensions once it has been
// measured. An edge entity carries an Edge.

#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord, Serialize, Deserialize, From, Display)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Measured size of a node
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize, From)]
pub struct Dimensions(pub Vec2);

impl Dimensions {
    /// The size to lay the node out with, `fallback` for unmeasured axes
    pub fn or(self, fallback: Vec2) -> Vec2 {
        Vec2::new(
            if self.0.x > 0.0 { self.0.x } else { fallback.x },
            if self.0.y > 0.0 { self.0.y } else { fallback.y },
        )
    }
}

#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize, From)]
pub struct Position(pub Pos2);

/// Side of a node where edges attach
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum HandleSide {
    Left,
    Top,
    Right,
    Bottom,
}

/// Where outgoing (`source`) and incoming (`target`) edges attach
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct Handles {
    pub source: HandleSide,
    pub target: HandleSide,
}

impl Handles {
    pub fn for_direction(direction: RankDir) -> Self {
        match direction {
            RankDir::LeftToRight => Self {
                source: HandleSide::Right,
                target: HandleSide::Left,
            },
            RankDir::TopToBottom => Self {
                source: HandleSide::Bottom,
                target: HandleSide::Top,
            },
        }
    }
}

impl Default for Handles {
    fn default() -> Self {
        Self::for_direction(RankDir::TopToBottom)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

/// Insertion order, so that listings are stable
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub(crate) struct Seq(pub u64);

/// A node as it is added to the store or written to a document
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(default)]
    pub dimensions: Option<Vec2>,
    #[serde(default)]
    pub position: Pos2,
    #[serde(default)]
    pub handles: Option<Handles>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            dimensions: None,
            position: Pos2::ZERO,
            handles: None,
        }
    }

    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.dimensions = Some(Vec2::new(width, height));
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Pos2::new(x, y);
        self
    }
}

/// Snapshot of a node read from the store
#[derive(Debug, PartialEq, Clone)]
pub struct NodeView {
    pub entity: hecs::Entity,
    pub id: NodeId,
    pub dimensions: Option<Vec2>,
    pub position: Pos2,
    pub handles: Handles,
}

/// Partial node update, `None` fields are left untouched
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct NodeUpdate {
    pub position: Option<Pos2>,
    pub dimensions: Option<Vec2>,
    pub handles: Option<Handles>,
}

impl NodeUpdate {
    pub fn position(position: Pos2) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn handles(handles: Handles) -> Self {
        Self {
            handles: Some(handles),
            ..Default::default()
        }
    }

    pub fn dimensions(dimensions: Vec2) -> Self {
        Self {
            dimensions: Some(dimensions),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Pos2) -> Self {
        self.position = Some(position);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_follow_direction() {
        let lr = Handles::for_direction(RankDir::LeftToRight);
        assert_eq!((lr.target, lr.source), (HandleSide::Left, HandleSide::Right));

        let tb = Handles::for_direction(RankDir::TopToBottom);
        assert_eq!((tb.target, tb.source), (HandleSide::Top, HandleSide::Bottom));
    }

    #[test]
    fn unmeasured_axes_fall_back() {
        let fallback = Vec2::new(150.0, 50.0);
        assert_eq!(Dimensions(Vec2::ZERO).or(fallback), fallback);
        assert_eq!(
            Dimensions(Vec2::new(80.0, 0.0)).or(fallback),
            Vec2::new(80.0, 50.0)
        );
        assert_eq!(
            Dimensions(Vec2::new(80.0, 30.0)).or(fallback),
            Vec2::new(80.0, 30.0)
        );
    }
}
