//! Event hub: fan-out of parsed messages to registered handlers.
//!
//! Handlers are keyed by event name (a command such as `PRIVMSG`, a numeric
//! such as `433`, or [`WILDCARD`]). Every handler invocation is spawned as
//! its own tokio task, so [`Hub::publish`] never waits on a handler and a
//! panicking handler only takes down its own task.

use crate::irc::message::Message;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

/// Event name that receives every message.
pub const WILDCARD: &str = "*";

type Handler<C> = Arc<dyn Fn(C, Arc<Message>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Registry of handlers. `C` is a context value cloned into every call,
/// normally the client handle so handlers can reply.
pub struct Hub<C> {
    handlers: RwLock<HashMap<String, Vec<Handler<C>>>>,
}

impl<C> Default for Hub<C> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }
}

impl<C> Hub<C>
where
    C: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`. Event names are matched exactly,
    /// except that commands are uppercase so `privmsg` is stored as `PRIVMSG`.
    pub fn subscribe<F, Fut>(&self, event: &str, handler: F)
    where
        F: Fn(C, Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler<C> = Arc::new(move |ctx, msg| handler(ctx, msg).boxed());
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers
            .entry(event.to_ascii_uppercase())
            .or_default()
            .push(handler);
    }

    /// Spawn every handler registered for `event`. Returns the number of
    /// handlers started; none of them has necessarily run yet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn publish(&self, event: &str, ctx: &C, msg: &Arc<Message>) -> usize {
        let targets: Vec<Handler<C>> = {
            let handlers = self
                .handlers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match handlers.get(event) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };

        for handler in &targets {
            let fut = handler(ctx.clone(), Arc::clone(msg));
            let event = event.to_string();
            tokio::spawn(async move {
                if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                    tracing::warn!(%event, "event handler panicked");
                }
            });
        }
        targets.len()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(event)
            .map_or(0, Vec::len)
    }
}
