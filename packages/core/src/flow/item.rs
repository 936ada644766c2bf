use super::error::{ItemError, NodeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zoho_flow_types::{Bytes, Value, json::json, mime_guess};

/// Opaque file payload travelling alongside an item's JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    #[serde(with = "bytes_serde")]
    pub data: Bytes,
    pub mime_type: String,
    pub file_name: Option<String>,
    pub file_extension: Option<String>,
}

impl BinaryData {
    /// Wraps raw bytes, deriving the file extension from the MIME type.
    /// `file_name` gains that extension when it has none.
    pub fn prepare(data: Bytes, file_name: Option<&str>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .map(|mime| mime.split(';').next().unwrap_or(mime).trim())
            .filter(|mime| !mime.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string();

        let file_extension = mime_guess::get_mime_extensions_str(&mime_type)
            .and_then(|extensions| extensions.first())
            .map(|ext| ext.to_string());

        let file_name = file_name.map(|name| match &file_extension {
            Some(ext) if !name.contains('.') => format!("{}.{}", name, ext),
            _ => name.to_string(),
        });

        BinaryData {
            data,
            mime_type,
            file_name,
            file_extension,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One unit of data flowing through a node.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub json: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<usize>,
}

impl Item {
    pub fn new(json: Value) -> Self {
        Item {
            json,
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Item::new(json!({}))
    }

    pub fn with_binary(mut self, property: &str, data: BinaryData) -> Self {
        self.binary.insert(property.to_string(), data);
        self
    }

    pub fn with_binaries(mut self, binaries: BTreeMap<String, BinaryData>) -> Self {
        self.binary.extend(binaries);
        self
    }

    pub fn paired_with(mut self, item_index: usize) -> Self {
        self.paired_item = Some(item_index);
        self
    }

    /// Output item recording a failure while processing `source`.
    pub fn failed(source: &Item, error: &NodeError, item_index: usize) -> Self {
        Item {
            json: source.json.clone(),
            binary: BTreeMap::new(),
            error: Some(error.to_item_error()),
            paired_item: Some(item_index),
        }
    }

    pub fn has_binary(&self) -> bool {
        !self.binary.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

mod bytes_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use zoho_flow_types::Bytes;

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(data)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let data = Vec::<u8>::deserialize(deserializer)?;
        Ok(Bytes::from(data))
    }
}
