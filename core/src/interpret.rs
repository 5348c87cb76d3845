//! Response interpretation: status allow-list, envelope decoding, dispatch.
//!
//! # Design
//! `interpret` is total: every `(status, body)` pair maps to exactly one
//! `Outcome`. The status check runs first so an envelope on an unexpected
//! status is never trusted. Error detail shapes are told apart structurally
//! (string vs. per-field map), never by asking the server for its version.

use tracing::debug;

use crate::envelope::{Envelope, ErrorDetails, ResponseBody};
use crate::http::HttpResponse;
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
}

impl Operation {
    /// Statuses whose body is worth decoding.
    pub fn allowed_statuses(self) -> &'static [u16] {
        match self {
            Operation::Create => &[200, 201, 422],
            Operation::Read => &[200, 401, 404, 422],
        }
    }

    pub fn accepts_status(self, status: u16) -> bool {
        self.allowed_statuses().contains(&status)
    }
}

pub fn interpret(operation: Operation, response: &HttpResponse) -> Outcome {
    let status = response.status;
    if !operation.accepts_status(status) {
        debug!(?operation, status, "status outside allow-list");
        return Outcome::TransportError { http_status: status };
    }

    let envelope: Envelope = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!(?operation, status, error = %err, "response did not match envelope");
            return Outcome::ParseError;
        }
    };

    let outcome = classify(operation, envelope.response);
    debug!(?operation, status, success = outcome.is_success(), "classified response");
    outcome
}

fn classify(operation: Operation, body: ResponseBody) -> Outcome {
    match (operation, body) {
        (Operation::Create, ResponseBody::Created { link, expires_on }) => {
            Outcome::Created { link, expires_on }
        }
        (Operation::Create, ResponseBody::Error { details: Some(details), .. }) => {
            from_details(details)
        }
        (
            Operation::Read,
            ResponseBody::Error { msg: Some(message), .. }
            | ResponseBody::Expired { msg: message }
            | ResponseBody::Invalid { msg: message },
        ) => Outcome::RemoteError { message },
        (Operation::Read, ResponseBody::Error { msg: None, details: Some(details) }) => {
            from_details(details)
        }
        (Operation::Read, ResponseBody::Success { msg }) => Outcome::ReadSuccess { message: msg },
        (operation, _) => {
            debug!(?operation, "no outcome for response shape");
            Outcome::ParseError
        }
    }
}

fn from_details(details: ErrorDetails) -> Outcome {
    match details {
        ErrorDetails::Message(message) => Outcome::RemoteError { message },
        ErrorDetails::Fields(located) => {
            let messages = located.json.first_messages();
            if messages.is_empty() {
                Outcome::ParseError
            } else {
                Outcome::ValidationError { messages }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(status: u16, body: &str) -> Outcome {
        interpret(Operation::Create, &HttpResponse::new(status, body))
    }

    fn read(status: u16, body: &str) -> Outcome {
        interpret(Operation::Read, &HttpResponse::new(status, body))
    }

    #[test]
    fn created() {
        let outcome = create(
            200,
            r#"{"response":{"status":"created","link":"L","expires_on":"E"}}"#,
        );
        assert_eq!(
            outcome,
            Outcome::Created {
                link: "L".to_string(),
                expires_on: "E".to_string(),
            }
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn created_with_201() {
        let outcome = create(
            201,
            r#"{"response":{"status":"created","link":"L","expires_on":"E"}}"#,
        );
        assert!(matches!(outcome, Outcome::Created { .. }));
    }

    #[test]
    fn validation_error() {
        let outcome = create(
            422,
            r#"{"response":{"status":"error","details":{"json":{"passphrase":["too short"]}}}}"#,
        );
        assert_eq!(
            outcome,
            Outcome::ValidationError {
                messages: vec!["too short".to_string()],
            }
        );
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn flat_details_is_remote_error() {
        let outcome = create(
            200,
            r#"{"response":{"status":"error","details":"Sorry, your passphrase is too weak."}}"#,
        );
        assert_eq!(
            outcome,
            Outcome::RemoteError {
                message: "Sorry, your passphrase is too weak.".to_string(),
            }
        );
    }

    #[test]
    fn create_error_without_details_is_parse_error() {
        let outcome = create(422, r#"{"response":{"status":"error","msg":"nope"}}"#);
        assert_eq!(outcome, Outcome::ParseError);
    }

    #[test]
    fn details_with_only_empty_lists_is_parse_error() {
        let outcome = create(
            422,
            r#"{"response":{"status":"error","details":{"json":{"passphrase":[]}}}}"#,
        );
        assert_eq!(outcome, Outcome::ParseError);
    }

    #[test]
    fn read_invalid_is_remote_error() {
        let outcome = read(404, r#"{"response":{"status":"invalid","msg":"secret not found"}}"#);
        assert_eq!(
            outcome,
            Outcome::RemoteError {
                message: "secret not found".to_string(),
            }
        );
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn read_expired_and_error_are_remote_errors() {
        for status in ["expired", "error"] {
            let body = format!(r#"{{"response":{{"status":"{status}","msg":"gone"}}}}"#);
            assert_eq!(
                read(404, &body),
                Outcome::RemoteError {
                    message: "gone".to_string(),
                },
                "{status}"
            );
        }
    }

    #[test]
    fn read_query_validation_error() {
        let outcome = read(
            422,
            r#"{"response":{"status":"error","details":{"query":{"passphrase":["Missing data for required field."]}}}}"#,
        );
        assert_eq!(
            outcome,
            Outcome::ValidationError {
                messages: vec!["Missing data for required field.".to_string()],
            }
        );
    }

    #[test]
    fn read_success() {
        let outcome = read(200, r#"{"response":{"status":"success","msg":"hello"}}"#);
        assert_eq!(
            outcome,
            Outcome::ReadSuccess {
                message: "hello".to_string(),
            }
        );
    }

    #[test]
    fn status_outside_allow_list_skips_body() {
        let body = r#"{"response":{"status":"created","link":"L","expires_on":"E"}}"#;
        assert_eq!(create(500, body), Outcome::TransportError { http_status: 500 });
        assert_eq!(create(404, body), Outcome::TransportError { http_status: 404 });
        assert_eq!(read(201, body), Outcome::TransportError { http_status: 201 });
    }

    #[test]
    fn non_json_body_is_parse_error() {
        assert_eq!(create(200, "<html>oops</html>"), Outcome::ParseError);
        assert_eq!(read(200, ""), Outcome::ParseError);
    }

    #[test]
    fn unknown_status_is_parse_error() {
        assert_eq!(
            read(200, r#"{"response":{"status":"pending","msg":"later"}}"#),
            Outcome::ParseError
        );
    }

    #[test]
    fn status_for_the_wrong_operation_is_parse_error() {
        assert_eq!(
            create(200, r#"{"response":{"status":"success","msg":"x"}}"#),
            Outcome::ParseError
        );
        assert_eq!(
            read(200, r#"{"response":{"status":"created","link":"L","expires_on":"E"}}"#),
            Outcome::ParseError
        );
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        assert_eq!(read(200, r#"{"response":{"status":"success"}}"#), Outcome::ParseError);
        assert_eq!(
            create(200, r#"{"response":{"status":"created","link":"L"}}"#),
            Outcome::ParseError
        );
    }

    #[test]
    fn allow_lists() {
        assert_eq!(Operation::Create.allowed_statuses(), [200, 201, 422]);
        assert_eq!(Operation::Read.allowed_statuses(), [200, 401, 404, 422]);
    }
}
