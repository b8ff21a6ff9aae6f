// ABOUTME: Library half of the workbench command-line driver
// ABOUTME: Event replay, configuration overrides and logging setup shared with the binary

pub mod logging;
pub mod overrides;
pub mod replay;

pub use logging::init_logging;
pub use overrides::Overrides;
pub use replay::{parse_events, replay, ReplayError, ReplayEvent, ReplayReport};
