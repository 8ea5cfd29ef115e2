//! Declarative constructors for the triggers levels use most.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use log::debug;
use maverick_spawns_core::{Camera, Event, EventKey, Lifecycle, Shape, Spawn};

use crate::{BoundsEnteredTrigger, EventTrigger, ShapeSupplier, TriggerOptions};

/// Region a camera-entry trigger watches.
pub enum Region {
    /// Region that never moves.
    Fixed(Shape),
    /// Region recomputed on every evaluation.
    Dynamic(ShapeSupplier),
}

impl Region {
    /// Wraps a supplier for a region that moves.
    #[must_use]
    pub fn dynamic(supplier: impl Fn() -> Shape + 'static) -> Self {
        Self::Dynamic(Box::new(supplier))
    }

    fn into_supplier(self) -> ShapeSupplier {
        match self {
            Self::Fixed(shape) => Box::new(move || shape.clone()),
            Self::Dynamic(supplier) => supplier,
        }
    }
}

impl From<Shape> for Region {
    fn from(shape: Shape) -> Self {
        Self::Fixed(shape)
    }
}

/// Builds a trigger that fires when the camera's bounds enter the region.
///
/// The camera is borrowed immutably on every evaluation, so callers must not
/// hold a mutable borrow of it while the scheduler updates.
#[must_use]
pub fn camera_entry<E, C>(
    camera: Rc<RefCell<C>>,
    region: impl Into<Region>,
    spawn: impl FnMut() -> Spawn<E> + 'static,
    options: TriggerOptions,
) -> BoundsEnteredTrigger<E>
where
    E: Lifecycle + Clone + 'static,
    C: Camera + 'static,
{
    debug!("created camera-entry trigger `{}`", options.label());
    let region = region.into().into_supplier();
    BoundsEnteredTrigger::new(
        spawn,
        region,
        move || camera.borrow().bounds(),
        options,
    )
}

/// Builds a trigger that fires when an event with one of `keys` satisfies `predicate`.
#[must_use]
pub fn event_driven<E, K>(
    keys: impl IntoIterator<Item = K>,
    predicate: impl FnMut(&Event) -> bool + 'static,
    spawn: impl FnMut() -> Spawn<E> + 'static,
    options: TriggerOptions,
) -> EventTrigger<E>
where
    E: Lifecycle + Clone + 'static,
    K: Into<EventKey>,
{
    let subscriptions: BTreeSet<EventKey> = keys.into_iter().map(Into::into).collect();
    debug!(
        "created event trigger `{}` listening to {:?}",
        options.label(),
        subscriptions
            .iter()
            .map(EventKey::as_str)
            .collect::<Vec<_>>()
    );
    EventTrigger::new(predicate, spawn, subscriptions, options)
}
