//! Shared re-exports for the Zoho flow crates.
//!
//! Downstream crates reach `serde_json`, `reqwest` and friends through this
//! crate so every package agrees on the same versions.

pub use ::anyhow::{self, Context, Error, Result, anyhow, bail};
pub use async_trait::async_trait;
pub use bytes::{self, Bytes};
pub use mime_guess;
pub use reqwest;
pub use schemars::{self, JsonSchema};
pub use serde_json::{self as json, Map, Value};
pub use tokio;

pub mod utils;
