//! Payloads for the `CONFIG` query parameter.
//!
//! Zoho reads operation options from a JSON document passed as a query string
//! value. Each builder returns a serializable struct; [`encode`] turns it into
//! the string that goes on the wire.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zoho_flow_types::{Result, json};

pub const CONFIG_PARAM: &str = "CONFIG";

/// One `{columnName, dataType, columnValue}` row of the column editor.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEntry {
    pub column_name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub column_value: String,
}

pub type ColumnValues = BTreeMap<String, String>;

/// Folds column entries into `columnName -> columnValue`. Later entries win.
pub fn column_values(entries: &[ColumnEntry]) -> ColumnValues {
    entries
        .iter()
        .filter(|entry| !entry.column_name.is_empty())
        .map(|entry| (entry.column_name.clone(), entry.column_value.clone()))
        .collect()
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    #[default]
    Append,
    TruncateAdd,
    UpdateAdd,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_all_rows: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_all_rows: Option<bool>,
}

pub fn add_row_config(columns: ColumnValues) -> RowsConfig {
    RowsConfig {
        columns: Some(columns),
        criteria: None,
        delete_all_rows: None,
        update_all_rows: None,
    }
}

/// With `modify_all` the criteria is dropped in favour of `deleteAllRows`.
pub fn delete_config(criteria: &str, modify_all: bool) -> RowsConfig {
    RowsConfig {
        columns: None,
        criteria: (!modify_all).then(|| criteria.to_string()),
        delete_all_rows: modify_all.then_some(true),
        update_all_rows: None,
    }
}

/// With `modify_all` the criteria is dropped in favour of `updateAllRows`.
pub fn update_config(columns: ColumnValues, criteria: &str, modify_all: bool) -> RowsConfig {
    RowsConfig {
        columns: Some(columns),
        criteria: (!modify_all).then(|| criteria.to_string()),
        delete_all_rows: None,
        update_all_rows: modify_all.then_some(true),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub response_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
}

pub fn export_config(criteria: &str) -> ExportConfig {
    ExportConfig {
        response_format: "json".to_string(),
        criteria: (!criteria.is_empty()).then(|| criteria.to_string()),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_type: Option<ImportType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub file_type: String,
    pub auto_identify: bool,
    pub retain_column_names: bool,
}

pub fn import_config(import_type: ImportType) -> ImportConfig {
    ImportConfig {
        import_type: Some(import_type),
        table_name: None,
        file_type: "json".to_string(),
        auto_identify: false,
        retain_column_names: true,
    }
}

pub fn import_new_table_config(table_name: &str) -> ImportConfig {
    ImportConfig {
        import_type: None,
        table_name: Some(table_name.to_string()),
        file_type: "json".to_string(),
        auto_identify: false,
        retain_column_names: true,
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewMetaConfig {
    pub with_involved_meta_info: bool,
}

pub fn view_meta_config() -> ViewMetaConfig {
    ViewMetaConfig {
        with_involved_meta_info: true,
    }
}

pub fn encode<T: Serialize>(config: &T) -> Result<String> {
    Ok(json::to_string(config)?)
}
