//! Request and response payloads for the cluster REST API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SqlRequest<'a> {
    pub sql: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SqlResponse {
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<String>,
    pub elapsed_millis: u64,
}

/// Error payload returned by the engine for a rejected request. The engine message is kept
/// verbatim, it is the only diagnostic an operator gets for a failed run.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorResponse {
    pub error_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSourceRequest<'a> {
    pub entity_type: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub source_type: &'a str,
    pub config: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn login_request_uses_engine_field_names() {
        let payload = serde_json::to_value(LoginRequest {
            user_name: "admin",
            password: "secret",
        })
        .unwrap();

        assert_eq!(
            payload,
            serde_json::json!({"userName": "admin", "password": "secret"})
        );
    }

    #[test]
    fn sql_response_parses_engine_payload() {
        let response: SqlResponse = serde_json::from_str(
            r#"{"rowCount": 42, "columns": ["c_name", "c_total"], "elapsedMillis": 1250}"#,
        )
        .unwrap();

        assert_eq!(response.row_count, 42);
        assert_eq!(response.columns, vec!["c_name", "c_total"]);
        assert_eq!(response.elapsed_millis, 1250);
    }

    #[test]
    fn sql_response_tolerates_missing_columns() {
        let response: SqlResponse =
            serde_json::from_str(r#"{"rowCount": 0, "elapsedMillis": 3}"#).unwrap();

        assert!(response.columns.is_empty());
    }

    #[test]
    fn error_response_keeps_message_verbatim() {
        let response: ErrorResponse = serde_json::from_str(
            r#"{"errorMessage": "VALIDATION ERROR: Table 'tpcds.store_sales' not found"}"#,
        )
        .unwrap();

        assert_eq!(
            response.error_message,
            "VALIDATION ERROR: Table 'tpcds.store_sales' not found"
        );
    }
}
