//! Domain models for the on-call log.

mod call_log;
mod draft;
mod drug;
mod patient;

pub use call_log::*;
pub use draft::*;
pub use drug::*;
pub use patient::*;
