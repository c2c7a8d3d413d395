use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashSet;
use std::hash::Hash;

/// Make the graph acyclic by reversing the edges that close a cycle during a
/// depth first traversal
///
/// Returns the reversed edges in their original orientation.
pub(crate) fn break_cycles<N>(graph: &mut DiGraphMap<N, ()>) -> Vec<(N, N)>
where
    N: Copy + Ord + Hash,
{
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut feedback = Vec::new();

    let roots: Vec<N> = graph.nodes().collect();
    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        on_stack.insert(root);
        let mut stack = vec![(root, successors(graph, root))];

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.pop() else {
                on_stack.remove(&node);
                stack.pop();
                continue;
            };

            if on_stack.contains(&next) {
                feedback.push((node, next));
            } else if visited.insert(next) {
                on_stack.insert(next);
                stack.push((next, successors(graph, next)));
            }
        }
    }

    for &(from, to) in &feedback {
        graph.remove_edge(from, to);
        graph.add_edge(to, from, ());
    }

    feedback
}

/// Successors in reverse order, so that popping visits them in graph order
fn successors<N>(graph: &DiGraphMap<N, ()>, node: N) -> Vec<N>
where
    N: Copy + Ord + Hash,
{
    let mut successors: Vec<N> = graph.neighbors_directed(node, Direction::Outgoing).collect();
    successors.reverse();
    successors
}
