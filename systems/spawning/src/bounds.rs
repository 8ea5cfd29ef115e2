use std::time::Duration;

use log::trace;
use maverick_spawns_core::{Lifecycle, Shape, Spawn};

use crate::trigger::{BaseTrigger, SpawnFn, Trigger, TriggerOptions};

/// Supplies a shape that may move between ticks.
pub type ShapeSupplier = Box<dyn Fn() -> Shape>;

/// Trigger that fires when one shape starts overlapping another.
///
/// Both shapes are re-read on every evaluation so either side may move, as a
/// camera frustum does. By default only the false to true transition of the
/// overlap fires; with `continue_checking_after_overlap` the trigger fires
/// whenever its gate is open and the shapes overlap.
pub struct BoundsEnteredTrigger<E> {
    base: BaseTrigger<E>,
    spawn: SpawnFn<E>,
    this: ShapeSupplier,
    other: ShapeSupplier,
    continue_checking_after_overlap: bool,
    entered: bool,
}

impl<E> BoundsEnteredTrigger<E> {
    /// Creates a trigger comparing `this` against `other`.
    #[must_use]
    pub fn new(
        spawn: impl FnMut() -> Spawn<E> + 'static,
        this: impl Fn() -> Shape + 'static,
        other: impl Fn() -> Shape + 'static,
        options: TriggerOptions,
    ) -> Self {
        let continue_checking_after_overlap = options.continue_checking_after_overlap();
        Self {
            base: options.into_base(),
            spawn: Box::new(spawn),
            this: Box::new(this),
            other: Box::new(other),
            continue_checking_after_overlap,
            entered: false,
        }
    }

    /// Whether the shapes overlapped at the last evaluation that passed the gate.
    #[must_use]
    pub const fn entered(&self) -> bool {
        self.entered
    }

    /// Shared trigger state.
    #[must_use]
    pub const fn base(&self) -> &BaseTrigger<E> {
        &self.base
    }
}

impl<E: Lifecycle + Clone> Trigger<E> for BoundsEnteredTrigger<E> {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn poll(&mut self) -> Option<Spawn<E>> {
        self.base.take_pending()
    }

    fn test(&mut self, _delta: Duration) -> bool {
        if !self.base.gate() {
            return self.base.is_pending();
        }

        let overlaps = (self.this)().overlaps(&(self.other)());
        if !self.entered && overlaps {
            let spawn = (self.spawn)();
            self.base.hold(spawn);
        }
        trace!(
            "bounds trigger `{}` evaluated: overlaps={overlaps} entered={}",
            self.base.label(),
            self.entered
        );

        self.entered = overlaps && !self.continue_checking_after_overlap;
        self.base.is_pending()
    }

    fn should_evaluate_this_tick(&mut self, delta: Duration) -> bool {
        self.base.should_evaluate_this_tick(delta)
    }

    fn should_be_culled(&mut self, delta: Duration) -> bool {
        self.base.should_be_culled(delta)
    }

    fn reset(&mut self) {
        self.base.reset();
        self.entered = false;
    }

    fn respawnable(&self) -> bool {
        self.base.respawnable()
    }

    fn set_respawnable(&mut self, respawnable: bool) {
        self.base.set_respawnable(respawnable);
    }
}
