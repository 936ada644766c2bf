pub mod error;
pub mod execution;
pub mod http;
pub mod item;
pub mod node;
pub mod oauth;
