use crate::{NodeSizes, Point, Vec2};
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use std::hash::Hash;

/// Assign node centers, ranks running along x
pub(crate) fn assign_coordinates<N, S>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, ()>,
    sizes: &S,
    spacing: Vec2,
    max_position_iterations: usize,
) -> HashMap<N, Point>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut positions = HashMap::new();

    assign_rank_positions(layers, sizes, &mut positions, spacing);
    assign_in_rank_positions(
        layers,
        graph,
        &mut positions,
        sizes,
        spacing,
        max_position_iterations,
    );

    positions
        .into_iter()
        .map(|(node, top_left)| {
            let size = sizes.size(node);
            (node, top_left.offset(Vec2::new(size.x / 2.0, size.y / 2.0)))
        })
        .collect()
}

/// Place every rank after the previous one, nodes centered in their rank
fn assign_rank_positions<N, S>(
    layers: &[Vec<N>],
    sizes: &S,
    positions: &mut HashMap<N, Point>,
    spacing: Vec2,
) where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut x = 0.0;
    for layer in layers {
        let rank_width = layer
            .iter()
            .map(|&node| sizes.size(node).x)
            .fold(0.0, f32::max);

        for &node in layer {
            let node_width = sizes.size(node).x;
            positions.insert(node, Point::new(x + (rank_width - node_width) / 2.0, 0.0));
        }
        x += rank_width + spacing.x;
    }
}

/// Stack nodes inside their rank, then pull them toward the barycenter of
/// their successors until nothing moves
fn assign_in_rank_positions<N, S>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, ()>,
    positions: &mut HashMap<N, Point>,
    sizes: &S,
    spacing: Vec2,
    max_iterations: usize,
) where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    for layer in layers {
        let mut y = 0.0;
        for &node in layer {
            if let Some(pos) = positions.get_mut(&node) {
                pos.y = y;
                y += spacing.y + sizes.size(node).y;
            }
        }
    }

    for _ in 0..max_iterations {
        let mut changed = false;

        for layer_idx in (0..layers.len().saturating_sub(1)).rev() {
            let layer = &layers[layer_idx];
            let before: Vec<f32> = layer.iter().map(|node| y_of(positions, node)).collect();

            for &node in layer {
                let Some(new_y) =
                    calculate_barycenter(node, &layers[layer_idx + 1], graph, positions, sizes)
                else {
                    continue;
                };
                if let Some(pos) = positions.get_mut(&node) {
                    pos.y = new_y;
                }
            }

            separate_rank(layer, positions, sizes, spacing.y);

            changed |= layer
                .iter()
                .zip(&before)
                .any(|(node, &y)| (y_of(positions, node) - y).abs() > 0.1);
        }

        if !changed {
            break;
        }
    }

    normalize_in_rank_positions(positions);
}

fn y_of<N: Eq + Hash>(positions: &HashMap<N, Point>, node: &N) -> f32 {
    positions.get(node).map_or(0.0, |pos| pos.y)
}

/// Top coordinate that centers the node on its successors in the next rank
fn calculate_barycenter<N, S>(
    node: N,
    next_layer: &[N],
    graph: &DiGraphMap<N, ()>,
    positions: &HashMap<N, Point>,
    sizes: &S,
) -> Option<f32>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut sum_y = 0.0;
    let mut count = 0;

    for &next_node in next_layer {
        if !graph.contains_edge(node, next_node) {
            continue;
        }
        if let Some(pos) = positions.get(&next_node) {
            sum_y += pos.y + sizes.size(next_node).y / 2.0;
            count += 1;
        }
    }

    (count > 0).then(|| sum_y / count as f32 - sizes.size(node).y / 2.0)
}

/// Push nodes down so that consecutive ones are at least `gap` away, keeping
/// the rank order
fn separate_rank<N, S>(layer: &[N], positions: &mut HashMap<N, Point>, sizes: &S, gap: f32)
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut min_top: Option<f32> = None;
    for &node in layer {
        let Some(pos) = positions.get_mut(&node) else {
            continue;
        };
        if let Some(min_top) = min_top {
            pos.y = pos.y.max(min_top);
        }
        min_top = Some(pos.y + sizes.size(node).y + gap);
    }
}

/// Shift everything so the topmost node starts at y=0
fn normalize_in_rank_positions<N>(positions: &mut HashMap<N, Point>)
where
    N: Copy + Ord + Hash,
{
    let min_y = positions.values().map(|pos| pos.y).reduce(f32::min).unwrap_or(0.0);

    for pos in positions.values_mut() {
        pos.y -= min_y;
    }
}
