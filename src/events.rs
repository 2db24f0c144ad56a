//! Typed collision pub/sub, used by the world and by individual bodies.

use std::fmt;

use crate::body::BodyId;
use crate::contact::Manifold;

/// Collision lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionEventKind {
    /// The pair began overlapping this step.
    Start,
    /// The pair overlapped last step and still does.
    Active,
    /// The pair stopped overlapping this step.
    End,
}

/// Payload delivered to collision handlers.
///
/// Bodies are referenced by id, so a handler holds no borrow of the
/// world and cannot mutate the body set mid-step. `manifold` is `None`
/// for end events only; the contact has already dissolved.
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub is_sensor: bool,
    pub manifold: Option<Manifold>,
}

/// Token returned by [`CollisionEvents::on`]; pass it to `off` to
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&CollisionEvent)>;

/// Handler registry for the three collision event kinds.
#[derive(Default)]
pub struct CollisionEvents {
    next_id: u64,
    start: Vec<(HandlerId, Handler)>,
    active: Vec<(HandlerId, Handler)>,
    end: Vec<(HandlerId, Handler)>,
}

impl CollisionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, kind: CollisionEventKind) -> &Vec<(HandlerId, Handler)> {
        match kind {
            CollisionEventKind::Start => &self.start,
            CollisionEventKind::Active => &self.active,
            CollisionEventKind::End => &self.end,
        }
    }

    fn list_mut(&mut self, kind: CollisionEventKind) -> &mut Vec<(HandlerId, Handler)> {
        match kind {
            CollisionEventKind::Start => &mut self.start,
            CollisionEventKind::Active => &mut self.active,
            CollisionEventKind::End => &mut self.end,
        }
    }

    /// Register a handler, returning its removal token.
    pub fn on(
        &mut self,
        kind: CollisionEventKind,
        handler: impl FnMut(&CollisionEvent) + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.list_mut(kind).push((id, Box::new(handler)));
        id
    }

    /// Remove one handler; returns whether it was registered.
    pub fn off(&mut self, kind: CollisionEventKind, id: HandlerId) -> bool {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|(registered, _)| *registered != id);
        list.len() != before
    }

    /// Drop every handler of `kind`, or all handlers when `None`.
    pub fn remove_all(&mut self, kind: Option<CollisionEventKind>) {
        match kind {
            Some(kind) => self.list_mut(kind).clear(),
            None => {
                self.start.clear();
                self.active.clear();
                self.end.clear();
            }
        }
    }

    pub fn has_listeners(&self, kind: CollisionEventKind) -> bool {
        !self.list(kind).is_empty()
    }

    /// Invoke every handler of `kind`, in registration order.
    pub fn emit(&mut self, kind: CollisionEventKind, event: &CollisionEvent) {
        for (_, handler) in self.list_mut(kind).iter_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for CollisionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionEvents")
            .field("start", &self.start.len())
            .field("active", &self.active.len())
            .field("end", &self.end.len())
            .finish()
    }
}
