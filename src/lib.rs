pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod keys;
pub mod runtime;
pub mod serial;
pub mod terminal;

pub use error::{Error, Result};
