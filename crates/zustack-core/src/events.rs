//! Session event bus
//!
//! Engine and widget callbacks push events here. The bus hands them to the session
//! one at a time in arrival order. An event emitted while the session is still
//! handling the previous one is queued and delivered right after it.

use crate::engine::{EngineError, EngineEvent};
use crate::widget::WidgetEvent;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Anything the session reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Engine(EngineEvent),
    Widget(WidgetEvent),
}

impl From<EngineEvent> for SessionEvent {
    fn from(event: EngineEvent) -> Self {
        SessionEvent::Engine(event)
    }
}

impl From<WidgetEvent> for SessionEvent {
    fn from(event: WidgetEvent) -> Self {
        SessionEvent::Widget(event)
    }
}

impl From<EngineError> for SessionEvent {
    fn from(err: EngineError) -> Self {
        SessionEvent::Engine(EngineEvent::Error(err))
    }
}

/// Receiver of bus events
pub trait EventHandler {
    fn handle_event(&mut self, event: SessionEvent);
}

#[derive(Default)]
struct BusInner {
    queue: RefCell<VecDeque<SessionEvent>>,
    handler: RefCell<Option<Weak<RefCell<dyn EventHandler>>>>,
}

/// Cloneable handle to a single-threaded event queue
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events to `handler`. Events queued before binding stay queued until
    /// the next [`drain`](Self::drain) or [`emit`](Self::emit).
    pub fn bind(&self, handler: Weak<RefCell<dyn EventHandler>>) {
        *self.inner.handler.borrow_mut() = Some(handler);
    }

    /// Queue an event and deliver everything pending
    pub fn emit(&self, event: impl Into<SessionEvent>) {
        self.inner.queue.borrow_mut().push_back(event.into());
        self.drain();
    }

    /// Deliver pending events. Does nothing when unbound, when the handler is
    /// gone, or when called from inside the handler.
    pub fn drain(&self) {
        let Some(handler) = self.inner.handler.borrow().as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let Ok(mut handler) = handler.try_borrow_mut() else {
            return;
        };

        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            match next {
                Some(event) => handler.handle_event(event),
                None => break,
            }
        }
    }

    /// Number of undelivered events
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending())
            .finish()
    }
}
