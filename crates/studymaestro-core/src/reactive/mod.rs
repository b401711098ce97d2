//! Reactive plumbing shared by every screen.

mod aggregator;
mod query;

pub use aggregator::{Aggregator, Screen, Source, Subscription, DEFAULT_STOP_TIMEOUT};
pub use query::Query;
