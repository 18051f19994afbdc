//! Bidirectional sync between stored mindmaps and git working directories

mod events;
mod lock;
mod orchestrator;
mod outcome;
mod target;

pub use events::{EventSink, SyncEvent, TracingEvents};
pub use lock::SyncLocks;
pub use orchestrator::{branch_or_main, SaveRequest, SyncOrchestrator};
pub use outcome::{FlowError, FlowOutcome, SyncReport};
pub use target::SyncTarget;
