//! Acquisition: turning wanted records into local packages.
//!
//! Operates on the set of records where `wanted` is set and `downloaded` is
//! not: existence check, streamed download, two-step conversion, then a
//! single store write recording the package path.

mod config;
mod error;
mod pipeline;
mod types;

pub use config::AcquisitionConfig;
pub use error::{AcquireError, DownloadError};
pub use pipeline::AcquisitionPipeline;
pub use types::{AcquireStatus, AcquisitionSummary};
