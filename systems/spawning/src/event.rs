use std::{collections::BTreeSet, time::Duration};

use log::trace;
use maverick_spawns_core::{Event, EventKey, Lifecycle, Spawn};

use crate::trigger::{BaseTrigger, EventObserver, SpawnFn, Trigger, TriggerOptions};

/// Decides whether a delivered event should fire the trigger.
pub type EventPredicate = Box<dyn FnMut(&Event) -> bool>;

/// Trigger that fires when a subscribed bus event satisfies a predicate.
///
/// Events are pushed through [`EventObserver::observe`]; the resulting spawn
/// is collected through the same [`Trigger::test`] and [`Trigger::poll`] pair
/// as every other trigger. Events arriving while a live spawn is held are
/// dropped, not queued.
pub struct EventTrigger<E> {
    base: BaseTrigger<E>,
    spawn: SpawnFn<E>,
    predicate: EventPredicate,
    subscriptions: BTreeSet<EventKey>,
}

impl<E> EventTrigger<E> {
    /// Creates a trigger listening to the provided keys.
    #[must_use]
    pub fn new(
        predicate: impl FnMut(&Event) -> bool + 'static,
        spawn: impl FnMut() -> Spawn<E> + 'static,
        subscriptions: BTreeSet<EventKey>,
        options: TriggerOptions,
    ) -> Self {
        Self {
            base: options.into_base(),
            spawn: Box::new(spawn),
            predicate: Box::new(predicate),
            subscriptions,
        }
    }

    /// Shared trigger state.
    #[must_use]
    pub const fn base(&self) -> &BaseTrigger<E> {
        &self.base
    }
}

impl<E: Lifecycle + Clone> EventObserver for EventTrigger<E> {
    fn subscriptions(&self) -> &BTreeSet<EventKey> {
        &self.subscriptions
    }

    fn observe(&mut self, event: &Event) {
        if !self.subscriptions.contains(event.key()) {
            return;
        }
        if !self.base.gate() {
            trace!(
                "event trigger `{}` ignored {}: spawn still held",
                self.base.label(),
                event.key()
            );
            return;
        }
        if (self.predicate)(event) {
            let spawn = (self.spawn)();
            self.base.hold(spawn);
        }
    }
}

impl<E: Lifecycle + Clone> Trigger<E> for EventTrigger<E> {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn poll(&mut self) -> Option<Spawn<E>> {
        self.base.take_pending()
    }

    fn test(&mut self, _delta: Duration) -> bool {
        let _ = self.base.gate();
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
    }

    fn respawnable(&self) -> bool {
        self.base.respawnable()
    }

    fn set_respawnable(&mut self, respawnable: bool) {
        self.base.set_respawnable(respawnable);
    }

    fn as_observer(&mut self) -> Option<&mut dyn EventObserver> {
        Some(self)
    }
}
