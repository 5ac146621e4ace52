//! Continuation chains.
//!
//! A node owns any number of *tracks*; each track is a strictly sequential
//! queue of steps:
//!
//! - `Tweens`: a batch that runs concurrently; the next step waits for every
//!   tween of the batch (AND-join).
//! - `Then`: a callback fired once the preceding batch has finished.
//! - `Promise`: a callback handed a fresh [`Guard`]; the track waits until any
//!   holder resolves it (OR-join, first wins).
//! - `Exit`: exits the owning node.
//!
//! Step lifecycle is `Pending → Running → {Fired, Cancelled}`. Cancellation is
//! dropping the track: queued callbacks are never invoked.

use std::collections::VecDeque;
use std::time::Duration;

use crate::graph::{Dob, Transform};

use super::signal::Guard;
use super::tween::{Tween, TweenSpec};

pub(crate) type ThenFn = Box<dyn for<'a> FnOnce(Dob<'a>)>;
pub(crate) type PromiseFn = Box<dyn for<'a> FnOnce(Dob<'a>, Guard)>;

pub(crate) enum Step {
    Tweens(Vec<TweenSpec>),
    Then(ThenFn),
    Promise(PromiseFn),
    Exit,
}

/// A step whose barrier has been passed and whose callback must run now.
pub(crate) enum Fired {
    Then(ThenFn),
    Promise(PromiseFn, Guard),
}

pub(crate) enum Poll {
    /// Waiting on running tweens or an unresolved guard.
    Idle,
    Fire(Fired),
    Exit,
    /// Nothing left to run; the track can be dropped.
    Done,
}

#[derive(Default)]
pub(crate) struct Track {
    batch: Vec<Tween>,
    steps: VecDeque<Step>,
    wait: Option<Guard>,
}

impl Track {
    /// Opens a track whose first batch starts immediately with `spec`.
    pub fn open(spec: TweenSpec, xf: &mut Transform) -> Self {
        let mut track = Track::default();
        track.push_tween(spec, xf);
        track
    }

    /// Adds a tween to the batch currently being issued.
    ///
    /// While nothing is queued the batch is the running one and the tween
    /// starts right away; otherwise it joins the last queued batch.
    pub fn push_tween(&mut self, spec: TweenSpec, xf: &mut Transform) {
        if self.steps.is_empty() && self.wait.is_none() {
            self.start(spec, xf);
            return;
        }
        match self.steps.back_mut() {
            Some(Step::Tweens(specs)) => specs.push(spec),
            _ => self.steps.push_back(Step::Tweens(vec![spec])),
        }
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    /// Advances the running batch in attach order, dropping finished tweens.
    pub fn advance(&mut self, dt: Duration, xf: &mut Transform) {
        for tween in &mut self.batch {
            tween.advance(dt, xf);
        }
        self.batch.retain(|t| !t.is_done());
    }

    /// Moves the track forward as far as it can without running user code.
    pub fn poll(&mut self, xf: &mut Transform) -> Poll {
        loop {
            if !self.batch.is_empty() {
                return Poll::Idle;
            }
            if let Some(guard) = &self.wait {
                if !guard.is_resolved() {
                    return Poll::Idle;
                }
                self.wait = None;
            }
            match self.steps.pop_front() {
                None => return Poll::Done,
                Some(Step::Tweens(specs)) => {
                    for spec in specs {
                        self.start(spec, xf);
                    }
                }
                Some(Step::Then(f)) => return Poll::Fire(Fired::Then(f)),
                Some(Step::Promise(f)) => {
                    let guard = Guard::new();
                    self.wait = Some(guard.clone());
                    return Poll::Fire(Fired::Promise(f, guard));
                }
                Some(Step::Exit) => return Poll::Exit,
            }
        }
    }

    /// Running tweens, queued steps and an unresolved wait.
    pub fn pending(&self) -> usize {
        self.batch.len() + self.steps.len() + self.wait.is_some() as usize
    }

    fn start(&mut self, spec: TweenSpec, xf: &mut Transform) {
        let mut tween = Tween::start(spec, xf);
        if spec.duration.is_zero() && tween.advance(Duration::ZERO, xf) {
            return;
        }
        self.batch.push(tween);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::tween::Prop;
    use crate::coords::Vec2;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn to(x: f32, d: u64) -> TweenSpec {
        TweenSpec::new(Prop::Position(Vec2::new(x, 0.0)), ms(d), None)
    }

    fn noop() -> ThenFn {
        Box::new(|_: Dob<'_>| {})
    }

    #[test]
    fn barrier_waits_for_whole_batch() {
        let mut xf = Transform::default();
        let mut track = Track::open(to(10.0, 100), &mut xf);
        track.push_tween(TweenSpec::new(Prop::Alpha(0.0), ms(300), None), &mut xf);
        track.push(Step::Then(noop()));

        track.advance(ms(100), &mut xf);
        assert!(matches!(track.poll(&mut xf), Poll::Idle));

        track.advance(ms(200), &mut xf);
        assert!(matches!(track.poll(&mut xf), Poll::Fire(Fired::Then(_))));
        assert!(matches!(track.poll(&mut xf), Poll::Done));
    }

    #[test]
    fn tweens_after_then_form_the_next_batch() {
        let mut xf = Transform::default();
        let mut track = Track::open(to(10.0, 100), &mut xf);
        track.push(Step::Then(noop()));
        track.push_tween(to(20.0, 100), &mut xf);
        track.push_tween(TweenSpec::new(Prop::Alpha(0.5), ms(100), None), &mut xf);
        assert_eq!(track.pending(), 3);

        track.advance(ms(100), &mut xf);
        assert!(matches!(track.poll(&mut xf), Poll::Fire(_)));
        // The second batch starts from where the first one ended.
        assert!(matches!(track.poll(&mut xf), Poll::Idle));
        track.advance(ms(50), &mut xf);
        assert_eq!(xf.pos, Vec2::new(15.0, 0.0));
        assert_eq!(xf.alpha, 0.75);
    }

    #[test]
    fn zero_duration_batch_passes_through() {
        let mut xf = Transform::default();
        let mut track = Track::open(to(5.0, 0), &mut xf);
        assert_eq!(xf.pos, Vec2::new(5.0, 0.0));
        track.push(Step::Exit);
        assert!(matches!(track.poll(&mut xf), Poll::Exit));
    }

    #[test]
    fn promise_blocks_until_guard_resolves() {
        let mut xf = Transform::default();
        let mut track = Track::default();
        track.push(Step::Promise(Box::new(|_: Dob<'_>, _: Guard| {})));
        track.push(Step::Exit);

        let guard = match track.poll(&mut xf) {
            Poll::Fire(Fired::Promise(_, g)) => g,
            _ => panic!("promise step should fire first"),
        };
        assert!(matches!(track.poll(&mut xf), Poll::Idle));

        assert!(guard.resolve());
        assert!(matches!(track.poll(&mut xf), Poll::Exit));
    }

    #[test]
    fn tweens_queued_behind_a_promise_wait_for_it() {
        let mut xf = Transform::default();
        let mut track = Track::default();
        track.push(Step::Promise(Box::new(|_: Dob<'_>, _: Guard| {})));
        track.push_tween(to(10.0, 100), &mut xf);
        assert_eq!(xf.pos, Vec2::zero());

        let Poll::Fire(Fired::Promise(_, guard)) = track.poll(&mut xf) else {
            panic!("promise step should fire first");
        };
        track.advance(ms(100), &mut xf);
        assert_eq!(xf.pos, Vec2::zero());

        guard.resolve();
        assert!(matches!(track.poll(&mut xf), Poll::Idle));
        track.advance(ms(100), &mut xf);
        assert_eq!(xf.pos, Vec2::new(10.0, 0.0));
    }
}
