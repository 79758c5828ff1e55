//! HTTP request handlers.

pub mod events;
pub mod health;
pub mod publish;

pub use events::event_stream;
pub use health::health_check;
pub use publish::publish_event;
