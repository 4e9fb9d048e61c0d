//! # Runtime Adapters
//!
//! Port implementations used by the runtime binary.

pub mod file_source;
pub mod presenter;

pub use file_source::FileStatusSource;
pub use presenter::{summarize, LoggingAvatarLoader, LoggingPresenter};
