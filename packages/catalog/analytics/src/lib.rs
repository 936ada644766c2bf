//! Zoho Analytics nodes
//!
//! - `credentials`: region lookup and the OAuth provider description
//! - `request`: request builder and the authenticated senders
//! - `config`: `CONFIG` query payloads
//! - `options`: dropdown loaders for organisations, workspaces, views and columns
//! - `nodes`: the table and template nodes
//! - `NodeConstructor` and `get_catalog()`

use std::sync::Arc;

pub use inventory;
pub use zoho_flow::flow::node::NodeLogic;

pub mod config;
pub mod credentials;
pub mod nodes;
pub mod options;
pub mod request;
pub mod selection;

pub use nodes::table::{TABLE_NODE_NAME, ZohoAnalyticsTableNode};
pub use nodes::template::{TEMPLATE_NODE_NAME, ZohoAnalyticsTemplateNode};

/// A node constructor function type
pub struct NodeConstructor {
    constructor: fn() -> Arc<dyn NodeLogic>,
}

impl NodeConstructor {
    pub const fn new(constructor: fn() -> Arc<dyn NodeLogic>) -> Self {
        Self { constructor }
    }

    pub fn construct(&self) -> Arc<dyn NodeLogic> {
        (self.constructor)()
    }
}

inventory::collect!(NodeConstructor);

inventory::submit! {
    NodeConstructor::new(|| Arc::new(ZohoAnalyticsTableNode::default()) as Arc<dyn NodeLogic>)
}

inventory::submit! {
    NodeConstructor::new(|| Arc::new(ZohoAnalyticsTemplateNode::default()) as Arc<dyn NodeLogic>)
}

pub fn get_catalog() -> Vec<Arc<dyn NodeLogic>> {
    inventory::iter::<NodeConstructor>()
        .map(|nc| nc.construct())
        .collect()
}
