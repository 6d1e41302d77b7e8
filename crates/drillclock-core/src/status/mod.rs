//! Live progress: per-program snapshots and the view that polls them.

mod registry;
mod view;

pub use registry::{StatusRegistry, StatusRow, StatusWriter};
pub use view::{StatusSink, StatusView};
