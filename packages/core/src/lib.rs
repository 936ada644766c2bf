//! Host contract for Zoho flow nodes.
//!
//! Nodes read parameters, credentials and binary data through
//! [`flow::execution::context::ExecutionContext`], send HTTP through the host's
//! transport and return one [`flow::item::Item`] per input item.

pub mod flow;

pub use zoho_flow_types;
