//! `handsample` - A small web service that collects handwriting samples
//!
//! Contributors answer a short questionnaire, then upload a photo of their
//! handwriting. Each accepted photo is stored under a generated name and
//! recorded, together with the answers, in a JSON metadata document.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod intake;
pub mod logging;
pub mod record;
pub mod server;
pub mod session;
pub mod storage;
pub mod upload;

pub use config::Config;
pub use error::{Error, RejectReason, Result};
pub use intake::Intake;
pub use logging::init_logging;
pub use record::{Draft, SubmissionRecord};
pub use session::{DraftStore, SessionId};
pub use storage::{MetadataStore, StoreStats, UploadDir};
pub use upload::{IncomingUpload, UploadPolicy};
