//! # Workbench Projects
//!
//! File synchronization for the Workbench sandbox: editor documents and
//! unsaved tracking, project loading with switch detection, and full
//! sandbox resets.

pub mod error;
pub mod files;
pub mod host;
pub mod preview;
pub mod workbench;

pub use error::{Result, WorkbenchError};
pub use files::FileStore;
pub use host::{decode_entry, read_host_tree};
pub use preview::{PreviewCache, PreviewInfo};
pub use workbench::{LoadReport, SaveReport, Workbench};
