use crate::comps::*;
use crate::store::rect_of_nodes;
use crate::{Error, FlowStore, LayoutOptions, Result};
use egui::{Pos2, Vec2};
use flowkit_graph_layout::{LayeredLayout, Layers, RankDir, Vec2 as LayoutVec2};
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionState {
    Pending,
    Complete,
    Abandoned,
}

/// Resolves once the positions computed by a layout are in the store
///
/// Can be awaited, or polled from a frame loop with [`Self::is_complete`].
#[derive(Debug)]
pub struct LayoutCompletion {
    rx: oneshot::Receiver<()>,
    state: CompletionState,
}

impl LayoutCompletion {
    fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx,
                state: CompletionState::Pending,
            },
        )
    }

    pub fn is_complete(&mut self) -> bool {
        if self.state == CompletionState::Pending {
            self.state = match self.rx.try_recv() {
                Ok(()) => CompletionState::Complete,
                Err(TryRecvError::Empty) => CompletionState::Pending,
                Err(TryRecvError::Closed) => CompletionState::Abandoned,
            };
        }
        self.state == CompletionState::Complete
    }
}

impl Future for LayoutCompletion {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.state {
            CompletionState::Complete => return Poll::Ready(Ok(())),
            CompletionState::Abandoned => return Poll::Ready(Err(Error::Abandoned)),
            CompletionState::Pending => {}
        }

        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(())) => {
                this.state = CompletionState::Complete;
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(_)) => {
                this.state = CompletionState::Abandoned;
                Poll::Ready(Err(Error::Abandoned))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Lays out the nodes of a [`FlowStore`] with the layered engine
#[derive(Debug, Default)]
pub struct AutoLayout {
    options: LayoutOptions,
    graph: Option<Layers<hecs::Entity>>,
    previous_direction: RankDir,
}

impl AutoLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Ranks computed by the last layout
    pub fn graph(&self) -> Option<&Layers<hecs::Entity>> {
        self.graph.as_ref()
    }

    /// Direction of the last layout
    pub fn previous_direction(&self) -> RankDir {
        self.previous_direction
    }

    /// Compute positions for `nodes` and write them into the store
    ///
    /// Every node gets the handle sides matching `direction`. Without
    /// animation positions are written at once, the view is fitted on the
    /// next tick and the returned completion is already resolved. With
    /// animation the viewport starts moving toward the new bounds right away,
    /// nodes travel from where they are, and the completion resolves after
    /// the last of them arrived.
    ///
    /// Edges with an endpoint outside of `nodes` are skipped.
    ///
    /// # Errors
    /// [`Error::UnknownNode`] if a node or an edge endpoint isn't in the store.
    pub fn layout(
        &mut self,
        store: &mut FlowStore,
        nodes: &[NodeId],
        edges: &[Edge],
        direction: RankDir,
        animate: bool,
    ) -> Result<LayoutCompletion> {
        info!(
            "Laying out {} nodes and {} edges {direction}{}",
            nodes.len(),
            edges.len(),
            if animate { ", animated" } else { "" }
        );

        // A fresh graph every time, so nothing removed since the last layout
        // can influence this one
        let mut graph = DiGraphMap::<hecs::Entity, ()>::new();
        let mut dimensions: HashMap<hecs::Entity, Vec2> = HashMap::new();

        for id in nodes {
            let entity = store
                .find_node(id)
                .ok_or_else(|| Error::UnknownNode(id.clone()))?;
            graph.add_node(entity);
            dimensions.insert(
                entity,
                store.resolved_dimensions(entity, self.options.default_dimensions),
            );
        }

        for edge in edges {
            let source = store
                .find_node(&edge.source)
                .ok_or_else(|| Error::UnknownNode(edge.source.clone()))?;
            let target = store
                .find_node(&edge.target)
                .ok_or_else(|| Error::UnknownNode(edge.target.clone()))?;

            if graph.contains_node(source) && graph.contains_node(target) {
                graph.add_edge(source, target, ());
            } else {
                warn!(
                    "Skipping edge {} -> {}, an endpoint is not being laid out",
                    edge.source, edge.target
                );
            }
        }

        debug!("Layout graph: {graph:?}");

        let engine = LayeredLayout {
            spacing: LayoutVec2::new(self.options.rank_spacing, self.options.node_spacing),
            rank_dir: direction,
            break_cycles: self.options.break_cycles,
            ..Default::default()
        };

        let size_provider = |node: hecs::Entity| {
            dimensions
                .get(&node)
                .map(|size| LayoutVec2::new(size.x, size.y))
                .unwrap_or_default()
        };

        let layers = engine.compute_layers(&graph)?;
        let centers = engine.compute_positions(&layers, &size_provider);
        self.graph = Some(layers);
        self.previous_direction = direction;

        let positions: Vec<(hecs::Entity, Pos2)> = graph
            .nodes()
            .filter_map(|node| centers.get(&node).map(|c| (node, Pos2::new(c.x, c.y))))
            .collect();

        let handles = Handles::for_direction(direction);
        let duration = self.options.animation_duration();
        let (done, completion) = LayoutCompletion::channel();

        if animate {
            let bounds = rect_of_nodes(positions.iter().map(|(node, position)| {
                let size = dimensions.get(node).copied().unwrap_or_default();
                (*position, size)
            }));
            store.fit_bounds(bounds, duration);

            let run = store.begin_animation_run(done);
            let started = positions.iter().try_for_each(|&(node, position)| {
                store.update_entity(node, NodeUpdate::handles(handles))?;
                store.animate_node(run, node, position, duration)
            });
            // Sealed even on failure so the completion still resolves
            store.seal_animation_run(run);
            started?;
        } else {
            for &(node, position) in &positions {
                store.update_entity(node, NodeUpdate::handles(handles).with_position(position))?;
            }
            store.request_fit_view();
            // Nobody may be listening
            let _ = done.send(());
        }

        Ok(completion)
    }
}
