//! Order activity broadcasting.
//!
//! The engine publishes an event whenever an order is created or changes status. Interested parties
//! (the notification dispatcher, mostly) register [`EventHooks`] at startup; the engine itself never
//! waits on a hook and a slow subscriber cannot block an order flow.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderCreatedEvent, OrderStatusChangedEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
