//! Zoho Analytics nodes and the per-item loop they share.

pub mod table;
pub mod template;

use serde::Serialize;
use serde::de::DeserializeOwned;
use zoho_flow::flow::{
    error::{NodeError, NodeResult},
    execution::{ExecutionContextExt, LogLevel, context::ExecutionContext},
    item::Item,
};
use zoho_flow_types::Value;

use crate::request::ZohoRequest;

pub const ICON: &str = "/flow/icons/zoho-analytics.svg";
pub const CATEGORY: &str = "Data/Zoho Analytics";

/// Zoho wraps payloads in `data`; fall back to the whole body when it is absent.
pub fn response_data(mut body: Value) -> Value {
    match body.get_mut("data") {
        Some(data) => data.take(),
        None => body,
    }
}

/// Reads a per-item parameter, using `default` when it is unset.
pub fn parameter<T: DeserializeOwned>(
    context: &dyn ExecutionContext,
    name: &str,
    item_index: usize,
    default: T,
) -> NodeResult<T> {
    context
        .evaluate_parameter_or(name, item_index, default)
        .map_err(|e| NodeError::user_input(context.node_name(), e.to_string()))
}

/// Reads the operation from the first item. An unknown value is a configuration error.
pub fn read_operation<T: DeserializeOwned>(context: &dyn ExecutionContext, default: Option<T>) -> NodeResult<T> {
    let result = match default {
        Some(default) => context.evaluate_parameter_or("operation", 0, default),
        None => context.evaluate_parameter("operation", 0),
    };
    result.map_err(|e| NodeError::configuration(context.node_name(), e.to_string()))
}

pub fn with_config<T: Serialize>(node: &str, request: ZohoRequest, config: &T) -> NodeResult<ZohoRequest> {
    request
        .config(config)
        .map_err(|e| NodeError::user_input(node, "Could not encode CONFIG").with_cause(e))
}

/// Files one item's outcome into `output`.
///
/// Failures become error items when the node continues on fail; otherwise the
/// error is returned tagged with `item_index`.
pub fn collect_outcome(
    context: &mut dyn ExecutionContext,
    output: &mut Vec<Item>,
    item_index: usize,
    outcome: NodeResult<Item>,
) -> NodeResult<()> {
    let error = match outcome {
        Ok(item) => {
            output.push(item);
            return Ok(());
        }
        Err(error) => error.at_item(item_index),
    };

    if !context.continue_on_fail() {
        return Err(error);
    }

    context.log_message(&error.to_string(), LogLevel::Warn);
    let source = context
        .input_items()
        .get(item_index)
        .cloned()
        .unwrap_or_default();
    output.push(Item::failed(&source, &error, item_index));
    Ok(())
}
