//! The dispatcher attempts every registered channel once, in order, and turns
//! each attempt into a `DeliveryOutcome`. Nothing a channel does, including
//! panicking, stops the remaining channels from running.

use crate::core::{DeliveryOutcome, FormatHint, Notification};
use crate::notification::{Channel, ChannelRegistry, NotifyError};
use futures::FutureExt;
use std::any::Any;
use std::error::Error as _;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

/// Fans a notification out over a [`ChannelRegistry`].
pub struct Dispatcher {
    registry: ChannelRegistry,
    debug: bool,
}

impl Dispatcher {
    /// Creates a new `Dispatcher`. With `debug` set, failed status lines carry
    /// the full error trace.
    pub fn new(registry: ChannelRegistry, debug: bool) -> Self {
        Self { registry, debug }
    }

    /// Delivers over every channel, printing each status line as soon as its
    /// channel finishes.
    pub async fn push(&self, title: &str, content: &str, format: FormatHint) -> Vec<DeliveryOutcome> {
        let notification = Notification::new(title, content, format);
        self.dispatch_with(&notification, |outcome| println!("{}", outcome))
            .await
    }

    /// Attempts every channel in registry order without printing.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<DeliveryOutcome> {
        self.dispatch_with(notification, |_| {}).await
    }

    /// Attempts every channel in registry order, handing each outcome to
    /// `on_outcome` before the next channel starts.
    pub async fn dispatch_with<F>(&self, notification: &Notification, mut on_outcome: F) -> Vec<DeliveryOutcome>
    where
        F: FnMut(&DeliveryOutcome),
    {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for channel in self.registry.channels() {
            let outcome = self.attempt(channel.as_ref(), notification).await;
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        let delivered = outcomes.iter().filter(|o| o.succeeded).count();
        info!(
            delivered,
            attempted = outcomes.len(),
            "Notification dispatch finished"
        );
        outcomes
    }

    async fn attempt(&self, channel: &dyn Channel, notification: &Notification) -> DeliveryOutcome {
        let name = channel.name();
        debug!(channel = name, "Attempting delivery");

        let result = AssertUnwindSafe(channel.send(notification))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(NotifyError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(()) => DeliveryOutcome::success(name),
            Err(e) => {
                warn!(channel = name, kind = e.kind(), error = %e, "Delivery failed");
                let mut message = format!("{}: {}", e.kind(), e);
                if self.debug {
                    message.push('\n');
                    message.push_str(&error_trace(&e));
                }
                DeliveryOutcome::failure(name, message)
            }
        }
    }
}

/// The error, its chain of causes, and its debug representation.
fn error_trace(error: &NotifyError) -> String {
    let mut trace = format!("Error: {}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\nCaused by: {}", cause));
        source = cause.source();
    }
    trace.push_str(&format!("\nDetails: {:?}", error));
    trace
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
