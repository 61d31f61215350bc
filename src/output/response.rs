//! JSON envelope printed for every command, and the exit code policy.

use std::io::{self, Write};

use rebrander::error::Hint;
use rebrander::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct CliResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

impl From<&Error> for CliError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
            hints: err.hints.clone(),
        }
    }
}

impl From<Result<Value>> for CliResponse {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(CliError::from(&err)),
            },
        }
    }
}

fn serialize_error(err: serde_json::Error) -> Error {
    Error::internal_json(err.to_string(), Some("serialize response".to_string()))
}

/// Serialize a command's output and pick its exit code.
///
/// Errors take their exit code from `exit_code_for_error`; successful
/// commands keep the code they returned.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (Err(serialize_error(err)), 1),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigMissingFile
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::BackupNotFound => 4,

        ErrorCode::BackupFailed | ErrorCode::RollbackFailed => 20,

        ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

/// Pretty-print the envelope to stdout. A closed pipe is not an error.
pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&CliResponse::from(result)).map_err(serialize_error)?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_stable_exit_codes() {
        assert_eq!(exit_code_for_error(ErrorCode::ConfigInvalidJson), 2);
        assert_eq!(exit_code_for_error(ErrorCode::BackupNotFound), 4);
        assert_eq!(exit_code_for_error(ErrorCode::RollbackFailed), 20);
        assert_eq!(exit_code_for_error(ErrorCode::InternalIoError), 1);
    }

    #[test]
    fn failed_command_keeps_error_code() {
        let result: Result<(u8, i32)> = Err(Error::backup_not_found("a.js", "a.js.backup.1"));
        let (json, exit_code) = map_cmd_result_to_json(result);

        assert_eq!(exit_code, 4);
        let response = CliResponse::from(json);
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.unwrap().code, "backup.not_found");
    }

    #[test]
    fn successful_command_serializes_data() {
        let (json, exit_code) = map_cmd_result_to_json(Ok((vec!["a", "b"], 1)));
        assert_eq!(exit_code, 1);

        let response = CliResponse::from(json);
        assert!(response.success);
        assert_eq!(response.data, Some(serde_json::json!(["a", "b"])));
        assert!(response.error.is_none());
    }

    #[test]
    fn hints_are_omitted_when_empty() {
        let err = Error::backup_not_found("a.js", "a.js.backup.1");
        let value = serde_json::to_value(CliError::from(&err)).unwrap();
        assert!(value.get("hints").is_none());
    }
}
