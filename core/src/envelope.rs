//! Decoding of the `{"rsp": {"stat": ..., ...}}` response envelope.
//!
//! # Design
//! The envelope is read as a `serde_json::Value` first and only the payload of
//! an `ok` response is handed to the typed decoder. A `fail` response becomes
//! a [`RemoteError`] no matter what else is in `rsp`, so a half-populated
//! payload next to an error can never mask the error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, RemoteError, Result, TransportError};
use crate::http::HttpResponse;

const STAT_OK: &str = "ok";
const STAT_FAIL: &str = "fail";

/// Decode `response` into the method payload `T`.
///
/// Non-200 statuses are transport errors carrying the body.
pub fn parse_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    check_status(response)?;
    let body = response.body.as_str();

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::protocol(format!("invalid JSON: {e}"), body))?;
    let mut rsp = match value {
        Value::Object(mut root) => match root.remove("rsp") {
            Some(Value::Object(rsp)) => rsp,
            _ => return Err(Error::protocol("missing rsp object", body)),
        },
        _ => return Err(Error::protocol("top level is not an object", body)),
    };

    match rsp.remove("stat") {
        Some(Value::String(stat)) if stat == STAT_OK => {
            rsp.remove("err");
            serde_json::from_value(Value::Object(rsp))
                .map_err(|e| Error::protocol(format!("payload mismatch: {e}"), body))
        }
        Some(Value::String(stat)) if stat == STAT_FAIL => Err(remote_error(&rsp, body)),
        Some(other) => Err(Error::protocol(format!("unknown stat {other}"), body)),
        None => Err(Error::protocol("missing stat", body)),
    }
}

fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}

fn remote_error(rsp: &Map<String, Value>, body: &str) -> Error {
    let Some(Value::Object(err)) = rsp.get("err") else {
        return Error::protocol("stat fail without err", body);
    };
    // Codes are documented as strings but some responses send numbers.
    let code = match err.get("code") {
        Some(Value::String(code)) => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        _ => return Error::protocol("err without code", body),
    };
    let message = err
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Error::Remote(RemoteError { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthInfo, Frob, Login};

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn ok_envelope_decodes_payload() {
        let frob: Frob = parse_envelope(&ok(r#"{"rsp":{"stat":"ok","frob":"0a56717c3561e53584f292bb7081a533c197270c"}}"#)).unwrap();
        assert_eq!(frob.frob, "0a56717c3561e53584f292bb7081a533c197270c");
    }

    #[test]
    fn fail_envelope_is_remote_error() {
        let err = parse_envelope::<Frob>(&ok(
            r#"{"rsp":{"stat":"fail","err":{"code":"96","msg":"Invalid signature"}}}"#,
        ))
        .unwrap_err();
        match err {
            Error::Remote(e) => {
                assert_eq!(e.code, "96");
                assert_eq!(e.message, "Invalid signature");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn fail_wins_over_malformed_payload() {
        let err = parse_envelope::<AuthInfo>(&ok(
            r#"{"rsp":{"stat":"fail","auth":42,"err":{"code":"101","msg":"Invalid frob - did you authenticate?"}}}"#,
        ))
        .unwrap_err();
        assert!(err.is_frob_pending());
    }

    #[test]
    fn numeric_code_is_normalized() {
        let err = parse_envelope::<Frob>(&ok(r#"{"rsp":{"stat":"fail","err":{"code":98,"msg":"Login failed / Invalid auth token"}}}"#)).unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError { ref code, .. }) if code == "98"));
    }

    #[test]
    fn fail_without_err_is_protocol_error() {
        let err = parse_envelope::<Frob>(&ok(r#"{"rsp":{"stat":"fail"}}"#)).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn ok_with_absent_optional_fields() {
        let login: Login = parse_envelope(&ok(r#"{"rsp":{"stat":"ok"}}"#)).unwrap();
        assert!(login.user.id.is_empty());
    }

    #[test]
    fn non_200_is_transport_error_with_body() {
        let response = HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "bad gateway".to_string(),
        };
        let err = parse_envelope::<Frob>(&response).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Status { status: 502, ref body }) if body == "bad gateway"
        ));
    }

    #[test]
    fn garbage_body_is_protocol_error_with_body() {
        let err = parse_envelope::<Frob>(&ok("<html>oops</html>")).unwrap_err();
        match err {
            Error::Protocol { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn missing_rsp_is_protocol_error() {
        let err = parse_envelope::<Frob>(&ok(r#"{"stat":"ok","frob":"x"}"#)).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
