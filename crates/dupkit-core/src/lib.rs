pub mod config;
pub mod destination;
pub mod error;
pub mod filter;
pub mod resolver;
pub mod settings;
pub mod snapshot;
pub mod timestamp;

pub use error::{Error, Result};
