#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn scheduling system deciding, tick by tick, which entities to materialise.
//!
//! Triggers hold the conditions: a [`BoundsEnteredTrigger`] watches two shapes
//! for a new overlap, an [`EventTrigger`] watches bus events. The
//! [`SpawnScheduler`] owns the active triggers of the current room, evaluates
//! them once per update in registration order and collects the spawns they
//! produce until the game loop drains them.

use std::{fmt, time::Duration, vec::Drain};

use log::debug;
use maverick_spawns_core::{Event, Spawn};

mod bounds;
mod event;
pub mod factory;
mod trigger;

pub use bounds::{BoundsEnteredTrigger, ShapeSupplier};
pub use event::{EventPredicate, EventTrigger};
pub use trigger::{
    BaseTrigger, Cadence, CullPolicy, EventObserver, SpawnFn, Trigger, TriggerOptions,
};

/// Owns the active triggers and the spawns they produced.
///
/// [`SpawnScheduler::update`] only appends to the output; the game loop is
/// expected to call [`SpawnScheduler::drain_spawns`] after every update.
pub struct SpawnScheduler<E> {
    triggers: Vec<Box<dyn Trigger<E>>>,
    spawns: Vec<Spawn<E>>,
}

impl<E> Default for SpawnScheduler<E> {
    fn default() -> Self {
        Self {
            triggers: Vec::new(),
            spawns: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for SpawnScheduler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnScheduler")
            .field("triggers", &self.labels().collect::<Vec<_>>())
            .field("pending_spawns", &self.spawns.len())
            .finish()
    }
}

impl<E> SpawnScheduler<E> {
    /// Creates a scheduler without triggers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates every active trigger once, in registration order.
    ///
    /// Culled triggers are reset and removed without evaluation. Triggers that
    /// fire append their spawn to the output; one-shot triggers are then reset
    /// and removed.
    pub fn update(&mut self, delta: Duration) {
        let spawns = &mut self.spawns;
        self.triggers.retain_mut(|trigger| {
            if trigger.should_be_culled(delta) {
                debug!("culled trigger `{}`", trigger.label());
                trigger.reset();
                return false;
            }

            if !trigger.should_evaluate_this_tick(delta) || !trigger.test(delta) {
                return true;
            }

            let Some(spawn) = trigger.poll() else {
                return true;
            };
            spawns.push(spawn);

            if trigger.respawnable() {
                return true;
            }
            debug!("one-shot trigger `{}` consumed", trigger.label());
            trigger.reset();
            false
        });
    }

    /// Delivers a bus event to every active trigger subscribed to its key.
    pub fn notify(&mut self, event: &Event) {
        for trigger in &mut self.triggers {
            let Some(observer) = trigger.as_observer() else {
                continue;
            };
            if observer.subscriptions().contains(event.key()) {
                observer.observe(event);
            }
        }
    }

    /// Replaces the active triggers wholesale, resetting the discarded ones.
    ///
    /// Spawns already produced stay in the output until drained.
    pub fn set_triggers(&mut self, triggers: Vec<Box<dyn Trigger<E>>>) {
        drop(self.swap_triggers(triggers));
    }

    /// Replaces the active triggers and hands back the previous ones, reset.
    ///
    /// Returned triggers keep their held spawns, so registering them again
    /// later does not re-arm a trigger whose entity is still alive. Consumed
    /// one-shot and culled triggers are no longer active and are not returned.
    #[must_use = "dropping the returned triggers discards their spawn gates"]
    pub fn swap_triggers(
        &mut self,
        triggers: Vec<Box<dyn Trigger<E>>>,
    ) -> Vec<Box<dyn Trigger<E>>> {
        let mut discarded = std::mem::replace(&mut self.triggers, triggers);
        debug!(
            "replaced {} triggers with {}",
            discarded.len(),
            self.triggers.len()
        );
        for trigger in &mut discarded {
            trigger.reset();
        }
        discarded
    }

    /// Drops every trigger and every undrained spawn.
    pub fn reset(&mut self) {
        self.triggers.clear();
        self.spawns.clear();
    }

    /// Removes and yields the spawns produced since the last drain, oldest first.
    pub fn drain_spawns(&mut self) -> Drain<'_, Spawn<E>> {
        self.spawns.drain(..)
    }

    /// Spawns produced since the last drain.
    #[must_use]
    pub fn spawns(&self) -> &[Spawn<E>] {
        &self.spawns
    }

    /// Number of triggers still registered.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.triggers.len()
    }

    /// Whether no trigger is registered.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Labels of the registered triggers in evaluation order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(|trigger| trigger.label())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use maverick_spawns_core::{Lifecycle, Properties};

    use super::*;

    #[derive(Clone, Debug, Default)]
    struct Probe(Rc<Cell<bool>>);

    impl Lifecycle for Probe {
        fn is_dead(&self) -> bool {
            self.0.get()
        }
    }

    struct Always {
        base: BaseTrigger<Probe>,
        resets: Rc<Cell<u32>>,
        cull: bool,
    }

    impl Trigger<Probe> for Always {
        fn label(&self) -> &str {
            self.base.label()
        }

        fn poll(&mut self) -> Option<Spawn<Probe>> {
            self.base.take_pending()
        }

        fn test(&mut self, _delta: Duration) -> bool {
            if self.base.gate() {
                self.base.hold(Spawn::new(Probe::default(), Properties::new()));
            }
            self.base.is_pending()
        }

        fn should_be_culled(&mut self, _delta: Duration) -> bool {
            self.cull
        }

        fn reset(&mut self) {
            self.resets.set(self.resets.get() + 1);
        }

        fn respawnable(&self) -> bool {
            self.base.respawnable()
        }

        fn set_respawnable(&mut self, respawnable: bool) {
            self.base.set_respawnable(respawnable);
        }
    }

    fn always(
        label: &str,
        respawnable: bool,
        cull: bool,
    ) -> (Box<dyn Trigger<Probe>>, Rc<Cell<u32>>) {
        let resets = Rc::new(Cell::new(0));
        let trigger = Always {
            base: BaseTrigger::new(label, respawnable, Cadence::EveryTick, CullPolicy::Never),
            resets: Rc::clone(&resets),
            cull,
        };
        (Box::new(trigger), resets)
    }

    #[test]
    fn culled_triggers_are_reset_and_never_evaluated() {
        let (culled, culled_resets) = always("culled", true, true);
        let (kept, _) = always("kept", true, false);
        let mut scheduler = SpawnScheduler::new();
        scheduler.set_triggers(vec![culled, kept]);

        scheduler.update(Duration::from_millis(16));

        assert_eq!(culled_resets.get(), 1);
        assert_eq!(scheduler.labels().collect::<Vec<_>>(), ["kept"]);
        assert_eq!(scheduler.spawns().len(), 1);
    }

    #[test]
    fn one_shot_triggers_are_reset_when_consumed() {
        let (one_shot, resets) = always("one-shot", false, false);
        let mut scheduler = SpawnScheduler::new();
        scheduler.set_triggers(vec![one_shot]);

        scheduler.update(Duration::from_millis(16));

        assert_eq!(resets.get(), 1);
        assert_eq!(scheduler.active_count(), 0);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.drain_spawns().count(), 1);
        assert!(scheduler.spawns().is_empty());
    }

    #[test]
    fn replacing_triggers_resets_the_discarded_ones() {
        let (old, old_resets) = always("old", true, false);
        let (new, new_resets) = always("new", true, false);
        let mut scheduler = SpawnScheduler::new();
        scheduler.set_triggers(vec![old]);
        scheduler.update(Duration::from_millis(16));

        scheduler.set_triggers(vec![new]);

        assert_eq!(old_resets.get(), 1);
        assert_eq!(new_resets.get(), 0);
        assert_eq!(scheduler.spawns().len(), 1, "produced spawns survive replacement");
    }

    #[test]
    fn swapped_out_triggers_keep_their_gate() {
        let (parked, parked_resets) = always("parked", true, false);
        let (other, _) = always("other", true, false);
        let mut scheduler = SpawnScheduler::new();
        scheduler.set_triggers(vec![parked]);
        scheduler.update(Duration::from_millis(16));
        assert_eq!(scheduler.drain_spawns().count(), 1);

        let returned = scheduler.swap_triggers(vec![other]);
        assert_eq!(parked_resets.get(), 1);
        assert_eq!(scheduler.labels().collect::<Vec<_>>(), ["other"]);

        let _ = scheduler.swap_triggers(returned);
        scheduler.update(Duration::from_millis(16));
        assert!(
            scheduler.spawns().is_empty(),
            "re-registered trigger fired while its entity lives"
        );
    }

    #[test]
    fn reset_clears_triggers_and_output() {
        let (trigger, _) = always("any", true, false);
        let mut scheduler = SpawnScheduler::new();
        scheduler.set_triggers(vec![trigger]);
        scheduler.update(Duration::from_millis(16));

        scheduler.reset();

        assert_eq!(scheduler.active_count(), 0);
        assert!(scheduler.spawns().is_empty());
    }
}
