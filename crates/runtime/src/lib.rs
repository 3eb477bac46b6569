pub mod event_log;
pub mod generation;
pub mod metrics;

pub use event_log::*;
pub use generation::*;
pub use metrics::*;
