use crate::animate::{Animator, NodeAnimation, RunId};
use crate::comps::*;
use crate::{Error, FlowConfig, Result, Viewport};
use egui::{Pos2, Rect, Vec2};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Bounding rect of nodes given as (position, size), position being the
/// top-left corner of each node
pub fn rect_of_nodes(nodes: impl IntoIterator<Item = (Pos2, Vec2)>) -> Rect {
    nodes
        .into_iter()
        .map(|(position, size)| Rect::from_min_size(position, size))
        .fold(Rect::NOTHING, |bounds, rect| bounds.union(rect))
}

/// State of a node graph editor
///
/// Nodes and edges are entities of a hecs world. The store is advanced once
/// per frame by the host, which is when animations progress and deferred
/// viewport fits happen.
pub struct FlowStore {
    world: hecs::World,
    next_seq: u64,
    default_dimensions: Vec2,
    viewport: Viewport,
    animator: Animator,
    fit_view_on_next_tick: bool,
}

impl FlowStore {
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            world: hecs::World::new(),
            next_seq: 0,
            default_dimensions: config.layout.default_dimensions,
            viewport: Viewport::new(config.viewport.clone()),
            animator: Animator::default(),
            fit_view_on_next_tick: false,
        }
    }

    fn seq(&mut self) -> Seq {
        let seq = Seq(self.next_seq);
        self.next_seq += 1;
        seq
    }

    pub fn add_node(&mut self, spec: NodeSpec) -> Result<hecs::Entity> {
        if self.find_node(&spec.id).is_some() {
            return Err(Error::DuplicateNode(spec.id));
        }

        let seq = self.seq();
        let mut builder = hecs::EntityBuilder::new();
        builder.add(seq);
        builder.add(Position(spec.position));
        builder.add(spec.handles.unwrap_or_default());
        if let Some(dimensions) = spec.dimensions {
            builder.add(Dimensions(dimensions));
        }
        builder.add(spec.id);

        Ok(self.world.spawn(builder.build()))
    }

    /// Both endpoints must already be in the store
    pub fn add_edge(&mut self, edge: Edge) -> Result<hecs::Entity> {
        for id in [&edge.source, &edge.target] {
            if self.find_node(id).is_none() {
                return Err(Error::UnknownNode(id.clone()));
            }
        }

        let seq = self.seq();
        Ok(self.world.spawn((seq, edge)))
    }

    /// Remove a node together with the edges attached to it
    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        let entity = self
            .find_node(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))?;

        let edges: Vec<hecs::Entity> = self
            .world
            .query::<&Edge>()
            .iter()
            .filter_map(|(entity, edge)| edge.touches(id).then_some(entity))
            .collect();

        debug!("Removing node {id} and {} edges", edges.len());
        for edge in edges {
            self.world.despawn(edge)?;
        }
        self.world.despawn(entity)?;
        self.animator.forget(entity);

        Ok(())
    }

    pub fn find_node(&self, id: &NodeId) -> Option<hecs::Entity> {
        self.world
            .query::<&NodeId>()
            .iter()
            .find_map(|(entity, node_id)| (node_id == id).then_some(entity))
    }

    pub fn node(&self, id: &NodeId) -> Option<NodeView> {
        self.find_node(id).and_then(|entity| self.node_by_entity(entity))
    }

    pub fn node_by_entity(&self, entity: hecs::Entity) -> Option<NodeView> {
        let mut query = self
            .world
            .query_one::<(&NodeId, Option<&Dimensions>, &Position, &Handles)>(entity)
            .ok()?;
        let (id, dimensions, position, handles) = query.get()?;

        Some(NodeView {
            entity,
            id: id.clone(),
            dimensions: dimensions.map(|d| d.0),
            position: position.0,
            handles: *handles,
        })
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> Vec<NodeView> {
        let mut nodes: Vec<(Seq, NodeView)> = self
            .world
            .query::<(&Seq, &NodeId, Option<&Dimensions>, &Position, &Handles)>()
            .iter()
            .map(|(entity, (seq, id, dimensions, position, handles))| {
                (
                    *seq,
                    NodeView {
                        entity,
                        id: id.clone(),
                        dimensions: dimensions.map(|d| d.0),
                        position: position.0,
                        handles: *handles,
                    },
                )
            })
            .collect();

        nodes.sort_by_key(|(seq, _)| *seq);
        nodes.into_iter().map(|(_, node)| node).collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().into_iter().map(|node| node.id).collect()
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<(Seq, Edge)> = self
            .world
            .query::<(&Seq, &Edge)>()
            .iter()
            .map(|(_, (seq, edge))| (*seq, edge.clone()))
            .collect();

        edges.sort_by_key(|(seq, _)| *seq);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> Result<()> {
        let entity = self
            .find_node(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))?;
        self.update_entity(entity, update)
    }

    /// Apply `update` to a node
    ///
    /// Setting a position cancels any animation of the node, which counts as
    /// finished for its run.
    pub fn update_entity(&mut self, entity: hecs::Entity, update: NodeUpdate) -> Result<()> {
        if let Some(position) = update.position {
            self.world.insert_one(entity, Position(position))?;
            self.animator.forget(entity);
        }
        if let Some(dimensions) = update.dimensions {
            self.world.insert_one(entity, Dimensions(dimensions))?;
        }
        if let Some(handles) = update.handles {
            self.world.insert_one(entity, handles)?;
        }
        Ok(())
    }

    /// Size of a node for layout purposes, `fallback` filling unmeasured axes
    pub fn resolved_dimensions(&self, entity: hecs::Entity, fallback: Vec2) -> Vec2 {
        self.world
            .get::<&Dimensions>(entity)
            .map(|dimensions| dimensions.or(fallback))
            .unwrap_or(fallback)
    }

    pub fn default_dimensions(&self) -> Vec2 {
        self.default_dimensions
    }

    /// Bounding rect of every node, `Rect::NOTHING` for an empty graph
    pub fn nodes_rect(&self) -> Rect {
        rect_of_nodes(self.nodes().into_iter().map(|node| {
            let size = self.resolved_dimensions(node.entity, self.default_dimensions);
            (node.position, size)
        }))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Snap the viewport onto the whole graph
    pub fn fit_view(&mut self) -> bool {
        let bounds = self.nodes_rect();
        self.viewport.fit_bounds(bounds, Duration::ZERO)
    }

    /// Fit the view on the next frame tick, once the host had a chance to
    /// render the current state
    pub fn request_fit_view(&mut self) {
        self.fit_view_on_next_tick = true;
    }

    pub fn fit_bounds(&mut self, bounds: Rect, duration: Duration) -> bool {
        self.viewport.fit_bounds(bounds, duration)
    }

    pub fn begin_animation_run(&mut self, done: oneshot::Sender<()>) -> RunId {
        self.animator.begin_run(done)
    }

    pub fn seal_animation_run(&mut self, run: RunId) {
        self.animator.seal(run);
    }

    /// Move a node from where it currently is to `to` over `duration`
    pub fn animate_node(
        &mut self,
        run: RunId,
        entity: hecs::Entity,
        to: Pos2,
        duration: Duration,
    ) -> Result<()> {
        let from = self
            .world
            .get::<&Position>(entity)
            .map(|position| position.0)
            .map_err(|_| hecs::NoSuchEntity)?;
        self.animator
            .animate(run, entity, NodeAnimation::new(from, to, duration));
        Ok(())
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating() || self.viewport.is_animating() || self.fit_view_on_next_tick
    }

    /// One frame tick
    ///
    /// Returns whether another tick is needed to finish the current animations.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if std::mem::take(&mut self.fit_view_on_next_tick) {
            info!("Fitting view");
            self.fit_view();
        }

        let world = &mut self.world;
        self.animator.advance(dt, |entity, position| {
            if world.insert_one(entity, Position(position)).is_err() {
                debug!("Animated node {entity:?} no longer exists");
            }
        });
        self.viewport.advance(dt);

        self.is_animating()
    }
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::new(&FlowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn store_with_chain() -> FlowStore {
        let mut store = FlowStore::default();
        store.add_node(NodeSpec::new("a").with_dimensions(100.0, 40.0)).unwrap();
        store.add_node(NodeSpec::new("b").at(300.0, 0.0)).unwrap();
        store.add_node(NodeSpec::new("c").at(600.0, 100.0)).unwrap();
        store.add_edge(Edge::new("a", "b")).unwrap();
        store.add_edge(Edge::new("b", "c")).unwrap();
        store
    }

    #[test]
    fn nodes_and_edges_keep_insertion_order() {
        let store = store_with_chain();

        assert_eq!(
            store.node_ids(),
            vec![NodeId::from("a"), NodeId::from("b"), NodeId::from("c")]
        );
        assert_eq!(store.edges(), vec![Edge::new("a", "b"), Edge::new("b", "c")]);
    }

    #[test]
    fn failed_animated_layout_closes_its_run() {
        let mut store = store_with_chain();
        let b = store.find_node(&"b".into()).unwrap();
        store.world.remove_one::<Position>(b).unwrap();

        let nodes = store.node_ids();
        let edges = store.edges();
        let result = crate::AutoLayout::default().layout(
            &mut store,
            &nodes,
            &edges,
            crate::RankDir::LeftToRight,
            true,
        );
        assert!(matches!(result, Err(Error::Despawned(_))));

        while store.advance(Duration::from_millis(16)) {}
        assert_eq!(store.animator.open_runs(), 0);
    }

    #[test]
    fn duplicate_and_dangling_are_rejected() {
        let mut store = store_with_chain();

        assert!(matches!(
            store.add_node(NodeSpec::new("a")),
            Err(Error::DuplicateNode(_))
        ));
        assert!(matches!(
            store.add_edge(Edge::new("a", "z")),
            Err(Error::UnknownNode(id)) if id == NodeId::from("z")
        ));
    }

    #[test]
    fn update_node_is_partial() {
        let mut store = store_with_chain();
        let id = NodeId::from("b");
        let handles = Handles::for_direction(flowkit_graph_layout::RankDir::LeftToRight);

        store.update_node(&id, NodeUpdate::handles(handles)).unwrap();
        store
            .update_node(&id, NodeUpdate::position(Pos2::new(1.0, 2.0)))
            .unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!(node.position, Pos2::new(1.0, 2.0));
        assert_eq!(node.handles, handles);
        assert_eq!(node.dimensions, None);

        assert!(matches!(
            store.update_node(&NodeId::from("z"), NodeUpdate::default()),
            Err(Error::UnknownNode(_))
        ));
    }

    #[test]
    fn dimensions_fall_back_to_defaults() {
        let store = store_with_chain();
        let a = store.find_node(&"a".into()).unwrap();
        let b = store.find_node(&"b".into()).unwrap();

        assert_eq!(
            store.resolved_dimensions(a, store.default_dimensions()),
            Vec2::new(100.0, 40.0)
        );
        assert_eq!(
            store.resolved_dimensions(b, store.default_dimensions()),
            Vec2::new(150.0, 50.0)
        );
    }

    #[test]
    fn nodes_rect_covers_every_node() {
        let store = store_with_chain();
        assert_eq!(
            store.nodes_rect(),
            Rect::from_min_max(Pos2::ZERO, Pos2::new(750.0, 150.0))
        );
        assert_eq!(FlowStore::default().nodes_rect(), Rect::NOTHING);
    }

    #[test]
    fn removing_a_node_removes_its_edges() {
        let mut store = store_with_chain();
        store.remove_node(&"b".into()).unwrap();

        assert_eq!(store.node_ids(), vec![NodeId::from("a"), NodeId::from("c")]);
        assert!(store.edges().is_empty());
        assert!(store.node(&"b".into()).is_none());
    }

    #[test]
    fn fit_view_waits_for_next_tick() {
        let mut store = store_with_chain();
        let before = store.viewport().transform();

        store.request_fit_view();
        assert_eq!(store.viewport().transform(), before);
        assert!(store.is_animating());

        assert!(!store.advance(Duration::from_millis(16)));
        assert_ne!(store.viewport().transform(), before);
        assert!(store.viewport().visible_rect().contains_rect(store.nodes_rect()));
    }

    #[test]
    fn animations_write_positions_every_frame() {
        let mut store = store_with_chain();
        let a = store.find_node(&"a".into()).unwrap();
        let (tx, mut rx) = oneshot::channel();

        let run = store.begin_animation_run(tx);
        store
            .animate_node(run, a, Pos2::new(100.0, 0.0), Duration::from_millis(100))
            .unwrap();
        store.seal_animation_run(run);

        assert!(store.advance(Duration::from_millis(50)));
        assert_eq!(store.node(&"a".into()).unwrap().position, Pos2::new(50.0, 0.0));
        assert!(rx.try_recv().is_err());

        assert!(!store.advance(Duration::from_millis(50)));
        assert_eq!(store.node(&"a".into()).unwrap().position, Pos2::new(100.0, 0.0));
        assert_eq!(rx.try_recv(), Ok(()));
    }
}
