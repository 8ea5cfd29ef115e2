use std::{collections::BTreeSet, fmt, time::Duration};

use log::debug;
use maverick_spawns_core::{Event, EventKey, Lifecycle, Spawn};

/// Lazily constructs the spawn a trigger emits when it fires.
pub type SpawnFn<E> = Box<dyn FnMut() -> Spawn<E>>;

/// Stateful predicate deciding, once per tick, whether an entity should be spawned.
pub trait Trigger<E> {
    /// Diagnostic name of the trigger.
    fn label(&self) -> &str;

    /// Hands over the pending spawn, if one was produced and not yet handed over.
    ///
    /// The trigger keeps watching the entity after the hand-over so it does not
    /// fire again while that entity is alive.
    fn poll(&mut self) -> Option<Spawn<E>>;

    /// Evaluates the trigger condition and reports whether a pending spawn is available.
    fn test(&mut self, delta: Duration) -> bool;

    /// Cheap gate deciding whether [`Trigger::test`] runs this tick.
    fn should_evaluate_this_tick(&mut self, _delta: Duration) -> bool {
        true
    }

    /// Reports whether the trigger should be permanently removed.
    fn should_be_culled(&mut self, _delta: Duration) -> bool {
        false
    }

    /// Clears transient condition state.
    fn reset(&mut self);

    /// Whether the trigger stays registered after firing.
    fn respawnable(&self) -> bool;

    /// Changes whether the trigger stays registered after firing.
    fn set_respawnable(&mut self, respawnable: bool);

    /// Event-observing capability, for triggers that react to bus events.
    fn as_observer(&mut self) -> Option<&mut dyn EventObserver> {
        None
    }
}

/// Capability of receiving bus events filtered by key.
pub trait EventObserver {
    /// Keys of the events the observer wants delivered.
    fn subscriptions(&self) -> &BTreeSet<EventKey>;

    /// Receives an event whose key is one of the subscriptions.
    fn observe(&mut self, event: &Event);
}

/// How often a trigger evaluates its condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cadence {
    /// Evaluate on every scheduler update.
    #[default]
    EveryTick,
    /// Evaluate at most once per elapsed interval of simulated time.
    Interval(Duration),
}

/// Policy deciding when a trigger removes itself from the scheduler.
#[derive(Default)]
pub enum CullPolicy {
    /// The trigger lives until consumed or replaced.
    #[default]
    Never,
    /// The trigger expires once the provided simulated time has elapsed.
    After(Duration),
    /// The trigger expires as soon as the predicate returns true.
    When(Box<dyn FnMut(Duration) -> bool>),
}

impl fmt::Debug for CullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "Never"),
            Self::After(lifetime) => f.debug_tuple("After").field(lifetime).finish(),
            Self::When(_) => write!(f, "When(..)"),
        }
    }
}

/// Options shared by every trigger kind.
#[derive(Debug)]
pub struct TriggerOptions {
    label: String,
    respawnable: bool,
    continue_checking_after_overlap: bool,
    cadence: Cadence,
    cull: CullPolicy,
}

impl TriggerOptions {
    /// Creates respawnable, rising-edge options evaluated every tick.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            respawnable: true,
            continue_checking_after_overlap: false,
            cadence: Cadence::EveryTick,
            cull: CullPolicy::Never,
        }
    }

    /// Overrides whether the trigger stays registered after firing.
    #[must_use]
    pub fn with_respawnable(mut self, respawnable: bool) -> Self {
        self.respawnable = respawnable;
        self
    }

    /// Makes bounds triggers fire whenever the shapes overlap instead of only on entry.
    #[must_use]
    pub fn with_continue_checking_after_overlap(mut self, enabled: bool) -> Self {
        self.continue_checking_after_overlap = enabled;
        self
    }

    /// Overrides the evaluation cadence.
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Overrides the cull policy.
    #[must_use]
    pub fn with_cull(mut self, cull: CullPolicy) -> Self {
        self.cull = cull;
        self
    }

    /// Diagnostic name given to the trigger.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn continue_checking_after_overlap(&self) -> bool {
        self.continue_checking_after_overlap
    }

    pub(crate) fn into_base<E>(self) -> BaseTrigger<E> {
        BaseTrigger::new(self.label, self.respawnable, self.cadence, self.cull)
    }
}

#[derive(Debug)]
struct Held<E> {
    spawn: Spawn<E>,
    delivered: bool,
}

/// State shared by every trigger kind: the held spawn and the policies around it.
///
/// The held spawn is the gate that prevents a second spawn while the first
/// entity lives, and that re-arms the trigger once it dies.
#[derive(Debug)]
pub struct BaseTrigger<E> {
    label: String,
    held: Option<Held<E>>,
    respawnable: bool,
    cadence: Cadence,
    since_evaluation: Duration,
    cull: CullPolicy,
    alive_for: Duration,
}

impl<E> BaseTrigger<E> {
    /// Creates an empty base with the provided policies.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        respawnable: bool,
        cadence: Cadence,
        cull: CullPolicy,
    ) -> Self {
        Self {
            label: label.into(),
            held: None,
            respawnable,
            cadence,
            since_evaluation: Duration::ZERO,
            cull,
            alive_for: Duration::ZERO,
        }
    }

    /// Diagnostic name of the trigger.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the trigger stays registered after firing.
    #[must_use]
    pub const fn respawnable(&self) -> bool {
        self.respawnable
    }

    /// Changes whether the trigger stays registered after firing.
    pub fn set_respawnable(&mut self, respawnable: bool) {
        self.respawnable = respawnable;
    }

    /// Spawn currently held, whether or not it was handed over.
    #[must_use]
    pub fn held(&self) -> Option<&Spawn<E>> {
        self.held.as_ref().map(|held| &held.spawn)
    }

    /// Advances the cadence accumulator and reports whether evaluation is due.
    pub fn should_evaluate_this_tick(&mut self, delta: Duration) -> bool {
        let interval = match self.cadence {
            Cadence::EveryTick => return true,
            Cadence::Interval(interval) if interval.is_zero() => return true,
            Cadence::Interval(interval) => interval,
        };

        self.since_evaluation = self.since_evaluation.saturating_add(delta);
        if self.since_evaluation < interval {
            return false;
        }
        let remainder = self.since_evaluation.as_nanos() % interval.as_nanos();
        self.since_evaluation =
            u64::try_from(remainder).map_or(Duration::ZERO, Duration::from_nanos);
        true
    }

    /// Advances the cull policy and reports whether the trigger expired.
    pub fn should_be_culled(&mut self, delta: Duration) -> bool {
        match &mut self.cull {
            CullPolicy::Never => false,
            CullPolicy::After(lifetime) => {
                self.alive_for = self.alive_for.saturating_add(delta);
                self.alive_for >= *lifetime
            }
            CullPolicy::When(predicate) => predicate(delta),
        }
    }

    /// Clears the cadence and cull accumulators.
    ///
    /// The held spawn survives a reset: it is the only record of an entity
    /// that may still be alive.
    pub fn reset(&mut self) {
        self.since_evaluation = Duration::ZERO;
        self.alive_for = Duration::ZERO;
    }
}

impl<E: Lifecycle + Clone> BaseTrigger<E> {
    /// Releases a spawn whose entity died, then reports whether nothing is held.
    ///
    /// Concrete triggers evaluate their own condition only when this passes.
    pub fn gate(&mut self) -> bool {
        if self
            .held
            .as_ref()
            .is_some_and(|held| held.spawn.entity().is_dead())
        {
            debug!("trigger `{}` re-armed: spawned entity died", self.label);
            self.held = None;
        }
        self.held.is_none()
    }

    /// Stores a freshly produced spawn.
    ///
    /// Must only be called after [`BaseTrigger::gate`] passed.
    pub fn hold(&mut self, spawn: Spawn<E>) {
        debug_assert!(self.held.is_none(), "trigger already holds a spawn");
        debug!("trigger `{}` fired", self.label);
        self.held = Some(Held {
            spawn,
            delivered: false,
        });
    }

    /// Reports whether a live spawn is waiting to be handed over.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.held
            .as_ref()
            .is_some_and(|held| !held.delivered && !held.spawn.entity().is_dead())
    }

    /// Hands over the pending spawn and keeps a copy to watch its entity.
    pub fn take_pending(&mut self) -> Option<Spawn<E>> {
        if !self.is_pending() {
            return None;
        }
        let held = self.held.as_mut()?;
        held.delivered = true;
        Some(held.spawn.clone())
    }
}
