//! Linear node position animations
//!
//! Animations are grouped in runs: a run is started by one layout and owns
//! the completion channel handed to its caller. The channel fires once every
//! animation of the run is over, whether it ran to the end or was replaced by
//! a newer animation of the same node.

use egui::Pos2;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome of advancing an animation by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Frame(Pos2),
    Finished(Pos2),
}

impl Step {
    pub fn position(self) -> Pos2 {
        match self {
            Step::Frame(pos) | Step::Finished(pos) => pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeAnimation {
    from: Pos2,
    to: Pos2,
    duration: Duration,
    elapsed: Duration,
}

impl NodeAnimation {
    pub fn new(from: Pos2, to: Pos2, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    pub fn target(&self) -> Pos2 {
        self.to
    }

    /// Fraction of the animation already played, in `0..=1`
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f32() / self.duration.as_secs_f32()
        }
    }

    /// The last step always lands exactly on the target
    pub fn step(&mut self, dt: Duration) -> Step {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.elapsed >= self.duration {
            Step::Finished(self.to)
        } else {
            Step::Frame(self.from.lerp(self.to, self.progress()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

#[derive(Debug)]
struct Run {
    remaining: usize,
    done: Option<oneshot::Sender<()>>,
}

#[derive(Debug, Default)]
pub struct Animator {
    active: BTreeMap<hecs::Entity, (RunId, NodeAnimation)>,
    runs: HashMap<RunId, Run>,
    next_run: u64,
}

impl Animator {
    /// Start a run that signals `done` once all its animations are over
    ///
    /// The run stays open until [`Animator::seal`] is called, so that it
    /// can't resolve while animations are still being added.
    pub fn begin_run(&mut self, done: oneshot::Sender<()>) -> RunId {
        let id = RunId(self.next_run);
        self.next_run += 1;
        self.runs.insert(
            id,
            Run {
                remaining: 1,
                done: Some(done),
            },
        );
        id
    }

    /// Close a run, resolving it right away if it has nothing left to play
    pub fn seal(&mut self, run: RunId) {
        self.finish_one(run);
    }

    /// Animate `node` as part of `run`, replacing any animation it already has
    pub fn animate(&mut self, run: RunId, node: hecs::Entity, animation: NodeAnimation) {
        if let Some(run) = self.runs.get_mut(&run) {
            run.remaining += 1;
        }
        if let Some((previous, _)) = self.active.insert(node, (run, animation)) {
            debug!("Animation of {node:?} replaced before finishing");
            self.finish_one(previous);
        }
    }

    /// Drop the animation of a node that no longer exists
    pub fn forget(&mut self, node: hecs::Entity) {
        if let Some((run, _)) = self.active.remove(&node) {
            self.finish_one(run);
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn open_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn target_of(&self, node: hecs::Entity) -> Option<Pos2> {
        self.active.get(&node).map(|(_, animation)| animation.target())
    }

    /// Advance every animation by `dt`, calling `on_frame` with the new
    /// position of each animated node, then resolve the runs that are over
    ///
    /// Returns whether animations remain.
    pub fn advance(&mut self, dt: Duration, mut on_frame: impl FnMut(hecs::Entity, Pos2)) -> bool {
        let mut finished = Vec::new();

        for (&node, (run, animation)) in self.active.iter_mut() {
            let step = animation.step(dt);
            on_frame(node, step.position());
            if let Step::Finished(_) = step {
                finished.push((node, *run));
            }
        }

        for (node, run) in finished {
            self.active.remove(&node);
            self.finish_one(run);
        }

        self.is_animating()
    }

    fn finish_one(&mut self, id: RunId) {
        let Some(run) = self.runs.get_mut(&id) else {
            return;
        };
        run.remaining = run.remaining.saturating_sub(1);
        if run.remaining > 0 {
            return;
        }

        if let Some(done) = self.runs.remove(&id).and_then(|run| run.done) {
            debug!("Animation run {id:?} finished");
            // The receiver may have been dropped, nobody is waiting then
            let _ = done.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const SECOND: Duration = Duration::from_secs(1);

    fn entities(n: usize) -> Vec<hecs::Entity> {
        let mut world = hecs::World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn interpolates_linearly() {
        let mut animation =
            NodeAnimation::new(Pos2::new(0.0, 0.0), Pos2::new(100.0, 50.0), SECOND);

        assert_eq!(
            animation.step(Duration::from_millis(250)),
            Step::Frame(Pos2::new(25.0, 12.5))
        );
        assert_eq!(
            animation.step(Duration::from_millis(250)),
            Step::Frame(Pos2::new(50.0, 25.0))
        );
        assert_eq!(animation.step(SECOND), Step::Finished(Pos2::new(100.0, 50.0)));
        assert_eq!(animation.progress(), 1.0);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut animation = NodeAnimation::new(Pos2::ZERO, Pos2::new(3.0, 4.0), Duration::ZERO);
        assert_eq!(animation.step(Duration::ZERO), Step::Finished(Pos2::new(3.0, 4.0)));
    }

    #[test]
    fn run_resolves_after_last_animation() {
        let nodes = entities(2);
        let mut animator = Animator::default();
        let (tx, mut rx) = oneshot::channel();

        let run = animator.begin_run(tx);
        animator.animate(run, nodes[0], NodeAnimation::new(Pos2::ZERO, Pos2::new(10.0, 0.0), SECOND / 2));
        animator.animate(run, nodes[1], NodeAnimation::new(Pos2::ZERO, Pos2::new(0.0, 10.0), SECOND));
        animator.seal(run);

        let mut frames = Vec::new();
        assert!(animator.advance(SECOND / 2, |node, pos| frames.push((node, pos))));
        assert_eq!(frames.len(), 2);
        assert!(rx.try_recv().is_err(), "resolved with an animation left");

        assert!(!animator.advance(SECOND / 2, |node, pos| frames.push((node, pos))));
        assert_eq!(frames.last(), Some(&(nodes[1], Pos2::new(0.0, 10.0))));
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn empty_run_resolves_when_sealed() {
        let mut animator = Animator::default();
        let (tx, mut rx) = oneshot::channel();

        let run = animator.begin_run(tx);
        assert!(rx.try_recv().is_err());
        animator.seal(run);
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn replaced_animation_counts_as_finished() {
        let nodes = entities(1);
        let mut animator = Animator::default();

        let (first_tx, mut first_rx) = oneshot::channel();
        let first = animator.begin_run(first_tx);
        animator.animate(first, nodes[0], NodeAnimation::new(Pos2::ZERO, Pos2::new(10.0, 0.0), SECOND));
        animator.seal(first);

        let (second_tx, mut second_rx) = oneshot::channel();
        let second = animator.begin_run(second_tx);
        animator.animate(second, nodes[0], NodeAnimation::new(Pos2::ZERO, Pos2::new(20.0, 0.0), SECOND));
        animator.seal(second);

        assert_eq!(first_rx.try_recv(), Ok(()));
        assert!(second_rx.try_recv().is_err());
        assert_eq!(animator.target_of(nodes[0]), Some(Pos2::new(20.0, 0.0)));

        animator.advance(SECOND, |_, _| {});
        assert_eq!(second_rx.try_recv(), Ok(()));
    }

    #[test]
    fn forgetting_a_node_settles_its_run() {
        let nodes = entities(1);
        let mut animator = Animator::default();
        let (tx, mut rx) = oneshot::channel();

        let run = animator.begin_run(tx);
        animator.animate(run, nodes[0], NodeAnimation::new(Pos2::ZERO, Pos2::new(10.0, 0.0), SECOND));
        animator.seal(run);
        animator.forget(nodes[0]);

        assert!(!animator.is_animating());
        assert_eq!(rx.try_recv(), Ok(()));
    }
}
