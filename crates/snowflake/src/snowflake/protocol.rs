//! Wire types for the Snowflake session and query endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sql::Statement;

/// Endpoint paths
pub const LOGIN_PATH: &str = "/session/v1/login-request";
pub const QUERY_PATH: &str = "/queries/v1/query-request";
pub const SESSION_PATH: &str = "/session";

/// Statement is still running; poll `getResultUrl`
pub const CODE_QUERY_IN_PROGRESS: &str = "333334";
/// Async execution accepted; poll `getResultUrl`
pub const CODE_QUERY_IN_PROGRESS_ASYNC: &str = "333333";
/// Session token expired
pub const CODE_SESSION_EXPIRED: &str = "390112";

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub data: LoginData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LoginData<'a> {
    pub client_app_id: &'a str,
    pub client_app_version: &'a str,
    pub account_name: &'a str,
    pub login_name: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub data: Option<LoginResponseData>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponseData {
    #[serde(default)]
    pub token: Option<String>,
}

/// One positional binding
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BindingValue {
    #[serde(rename = "type")]
    pub bind_type: &'static str,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub sql_text: &'a str,
    pub async_exec: bool,
    pub sequence_id: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, BindingValue>,
}

impl<'a> QueryRequest<'a> {
    pub fn new(statement: &'a Statement, sequence_id: u64) -> Self {
        Self {
            sql_text: &statement.text,
            async_exec: false,
            sequence_id,
            bindings: bindings(statement),
        }
    }
}

/// Positional bindings keyed by 1-based index
pub fn bindings(statement: &Statement) -> BTreeMap<String, BindingValue> {
    statement
        .params
        .iter()
        .map(|param| {
            let binding = param.value.binding();
            (
                param.position.to_string(),
                BindingValue {
                    bind_type: binding.bind_type.as_str(),
                    value: binding.value,
                },
            )
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<QueryResponseData>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: bool,
}

impl QueryResponse {
    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self.code(),
            CODE_QUERY_IN_PROGRESS | CODE_QUERY_IN_PROGRESS_ASYNC
        )
    }

    pub fn is_session_expired(&self) -> bool {
        self.code() == CODE_SESSION_EXPIRED
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponseData {
    #[serde(default)]
    pub rowtype: Vec<RowType>,
    #[serde(default)]
    pub rowset: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub get_result_url: Option<String>,
    #[serde(default)]
    pub stats: Option<QueryStats>,
}

#[derive(Debug, Deserialize)]
pub struct RowType {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    #[serde(default)]
    pub num_rows_inserted: u64,
    #[serde(default)]
    pub num_rows_updated: u64,
    #[serde(default)]
    pub num_rows_deleted: u64,
}

impl QueryStats {
    pub fn rows_affected(&self) -> u64 {
        self.num_rows_inserted + self.num_rows_updated + self.num_rows_deleted
    }
}
