use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;

/// Minimize edge crossings by swapping adjacent nodes in ranks
///
/// Greedy local search: a swap is kept only if it strictly reduces the
/// crossing count, so nodes otherwise stay in their input order.
pub(crate) fn minimize_crossings<N>(
    graph: &DiGraphMap<N, ()>,
    mut layers: Vec<Vec<N>>,
    max_iterations: usize,
) -> (Vec<Vec<N>>, usize)
where
    N: Copy + Ord + Hash,
{
    let mut crossings = count_crossings(graph, &layers);

    for _ in 0..max_iterations {
        if crossings == 0 {
            break;
        }

        let mut improved = false;
        for layer_index in 0..layers.len() {
            for i in 0..layers[layer_index].len().saturating_sub(1) {
                layers[layer_index].swap(i, i + 1);
                let after = count_crossings(graph, &layers);

                if after < crossings {
                    crossings = after;
                    improved = true;
                } else {
                    layers[layer_index].swap(i, i + 1);
                }
            }
        }

        if !improved {
            break;
        }
    }

    (layers, crossings)
}

/// Count the crossings between edges joining adjacent ranks
pub(crate) fn count_crossings<N>(graph: &DiGraphMap<N, ()>, layers: &[Vec<N>]) -> usize
where
    N: Copy + Ord + Hash,
{
    let mut crossings = 0;

    for pair in layers.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        let lower_index: HashMap<N, usize> =
            lower.iter().enumerate().map(|(i, &node)| (node, i)).collect();

        // Edges as (index in upper rank, index in lower rank)
        let mut segments = Vec::new();
        for (i, &node) in upper.iter().enumerate() {
            for target in graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(&j) = lower_index.get(&target) {
                    segments.push((i, j));
                }
            }
        }

        for (k, &(u1, l1)) in segments.iter().enumerate() {
            for &(u2, l2) in &segments[k + 1..] {
                if u1 != u2 && l1 != l2 && (u1 < u2) != (l1 < l2) {
                    crossings += 1;
                }
            }
        }
    }

    crossings
}
