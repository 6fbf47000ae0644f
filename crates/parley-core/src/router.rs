// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Handler registry for incoming server messages.

use std::collections::HashMap;

use parley_protocol::{MessageKind, ServerMessage};

pub type Handler<C> = Box<dyn Fn(&mut C, &ServerMessage) + Send>;

/// Which messages a handler receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Kind(MessageKind),
    /// Every message, after the kind-specific handlers ran.
    All,
}

impl From<MessageKind> for Route {
    fn from(kind: MessageKind) -> Self {
        Route::Kind(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Dispatches server messages to handlers over a caller-chosen context `C`.
pub struct MessageRouter<C> {
    next_id: u64,
    routes: HashMap<Route, Vec<(HandlerId, Handler<C>)>>,
}

impl<C> Default for MessageRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> MessageRouter<C> {
    pub fn new() -> Self {
        Self { next_id: 0, routes: HashMap::new() }
    }

    pub fn register<F>(&mut self, route: impl Into<Route>, handler: F) -> HandlerId
    where
        F: Fn(&mut C, &ServerMessage) + Send + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.routes.entry(route.into()).or_default().push((id, Box::new(handler)));
        id
    }

    /// Drop every handler on `route`; returns how many were removed.
    pub fn remove_route(&mut self, route: impl Into<Route>) -> usize {
        self.routes.remove(&route.into()).map_or(0, |h| h.len())
    }

    /// Drop a single handler; returns whether it was registered.
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        for handlers in self.routes.values_mut() {
            if let Some(pos) = handlers.iter().position(|(h, _)| *h == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, route: impl Into<Route>) -> usize {
        self.routes.get(&route.into()).map_or(0, Vec::len)
    }

    /// Run the handlers for the message's kind in registration order, then
    /// the [`Route::All`] handlers.  Returns the number of handlers invoked.
    pub fn dispatch(&self, ctx: &mut C, msg: &ServerMessage) -> usize {
        let mut invoked = 0;
        for route in [Route::Kind(msg.kind()), Route::All] {
            if let Some(handlers) = self.routes.get(&route) {
                for (_, handler) in handlers {
                    handler(ctx, msg);
                    invoked += 1;
                }
            }
        }
        invoked
    }
}
