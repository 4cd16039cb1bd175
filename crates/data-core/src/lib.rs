pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod get;
pub mod hasher;
pub mod http;
pub mod index;
pub mod io;
pub mod manifest;
pub mod pack;
pub mod paths;
pub mod store;

pub mod reporter;

pub use config::{Config, IndexSettings};
pub use context::Context;
pub use error::{DataError, Result};
pub use http::USER_AGENT;
pub use manifest::{CheckOutcome, Manifest};
pub use pack::{MakeOptions, Pack, PublishOutcome, TransferSummary};
pub use paths::*;
pub use reporter::{Direction, NullReporter, Reporter};
