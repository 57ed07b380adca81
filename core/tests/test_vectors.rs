//! Verify signing, URL building and envelope parsing against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! URL vectors compare whole URLs: the query is emitted in ascending key
//! order with form encoding, so the expected strings are canonical.

use rtm_core::{build_url, parse_base_url, sign, Client, Credentials, Error, Format, HttpResponse, Params, TransportError};
use serde_json::Value;

fn params(value: &Value) -> Params {
    value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

#[test]
fn signing_test_vectors() {
    let raw = include_str!("../../test-vectors/signing.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let secret = case["secret"].as_str().unwrap();
        let p = params(&case["params"]);
        assert_eq!(sign(secret, &p), case["expected"].as_str().unwrap(), "{name}");
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

#[test]
fn url_test_vectors() {
    let raw = include_str!("../../test-vectors/urls.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let credentials = Credentials::new(
        vectors["api_key"].as_str().unwrap(),
        vectors["secret"].as_str().unwrap(),
    )
    .unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let base = parse_base_url(case["base"].as_str().unwrap()).unwrap();
        let format = match case["format"].as_str().unwrap() {
            "json" => Format::Json,
            "unspecified" => Format::Unspecified,
            other => panic!("unknown format: {other}"),
        };
        let url = build_url(&base, &credentials, &params(&case["params"]), format);
        assert_eq!(url.as_str(), case["expected"].as_str().unwrap(), "{name}");

        // The signature must verify against the rest of the query.
        let mut query: Params = url.query_pairs().into_owned().collect();
        let sig = query.remove("api_sig").unwrap();
        assert_eq!(sign(vectors["secret"].as_str().unwrap(), &query), sig, "{name}: api_sig");
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[test]
fn envelope_test_vectors() {
    let raw = include_str!("../../test-vectors/envelopes.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let client = Client::new("1234567890", "987654321").unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let expected = &case["expected"];

        let result: Result<Value, Error> = match case["method"].as_str().unwrap() {
            "rtm.auth.getFrob" => client
                .parse_frob(response)
                .map(|f| serde_json::json!({ "frob": f.frob })),
            "rtm.auth.getToken" => client.parse_token(response).map(|a| {
                serde_json::json!({
                    "token": a.auth.token,
                    "perms": a.auth.perms,
                    "username": a.auth.user.username,
                })
            }),
            "rtm.auth.checkToken" => client.parse_check_token(response).map(|a| {
                serde_json::json!({
                    "token": a.auth.token,
                    "perms": a.auth.perms,
                    "username": a.auth.user.username,
                })
            }),
            "rtm.timelines.create" => client
                .parse_create_timeline(response)
                .map(|t| serde_json::json!({ "timeline": t.timeline })),
            "rtm.test.login" => client
                .parse_login(response)
                .map(|l| serde_json::json!({ "id": l.user.id })),
            "rtm.test.echo" => client
                .parse_echo(response)
                .map(|e| serde_json::json!({ "ping": e.ping })),
            other => panic!("unknown method: {other}"),
        };

        if let Some(ok) = expected.get("ok") {
            assert_eq!(&result.unwrap(), ok, "{name}");
        } else if let Some(remote) = expected.get("remote") {
            match result.unwrap_err() {
                Error::Remote(e) => {
                    assert_eq!(e.code, remote["code"].as_str().unwrap(), "{name}: code");
                    assert_eq!(e.message, remote["message"].as_str().unwrap(), "{name}: message");
                }
                other => panic!("{name}: expected remote error, got {other:?}"),
            }
        } else if expected.get("protocol").is_some() {
            let err = result.unwrap_err();
            assert!(matches!(err, Error::Protocol { .. }), "{name}: got {err:?}");
        } else if let Some(status) = expected.get("status") {
            match result.unwrap_err() {
                Error::Transport(TransportError::Status { status: got, body }) => {
                    assert_eq!(u64::from(got), status.as_u64().unwrap(), "{name}: status");
                    assert_eq!(body, case["body"].as_str().unwrap(), "{name}: body");
                }
                other => panic!("{name}: expected status error, got {other:?}"),
            }
        } else {
            panic!("{name}: vector has no expectation");
        }
    }
}
