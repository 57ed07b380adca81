use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const REST_PATH: &str = "/services/rest/";
pub const AUTH_PATH: &str = "/services/auth/";

/// Credentials the server accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub secret: String,
    /// Added before every REST answer, to simulate a slow service.
    pub delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "1234567890".to_string(),
            secret: "987654321".to_string(),
            delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub fullname: String,
}

#[derive(Clone, Debug)]
struct Grant {
    perms: String,
    user: User,
}

#[derive(Default)]
pub struct Store {
    /// frob -> perms granted by the user, `None` until approved.
    frobs: HashMap<String, Option<String>>,
    tokens: HashMap<String, Grant>,
    timelines: u64,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    db: Db,
}

/// Error answered inside a `stat: fail` envelope.
struct Fail(&'static str, String);

impl Fail {
    fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Fail(code, msg.into())
    }
}

pub fn app(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route(REST_PATH, get(rest))
        .route(AUTH_PATH, get(authorize))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

/// `api_sig` for `params` the way the real service computes it.
pub fn sign(secret: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update(v.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn demo_user() -> User {
    User {
        id: "1".to_string(),
        username: "bob".to_string(),
        fullname: "Bob T. Monkey".to_string(),
    }
}

fn verify(config: &MockConfig, params: &HashMap<String, String>) -> Result<BTreeMap<String, String>, Fail> {
    let mut signed: BTreeMap<String, String> = params.clone().into_iter().collect();
    let sig = signed
        .remove("api_sig")
        .ok_or_else(|| Fail::new("97", "Missing signature"))?;
    if signed.get("api_key") != Some(&config.api_key) {
        return Err(Fail::new("100", "Invalid API Key"));
    }
    if sign(&config.secret, &signed) != sig {
        return Err(Fail::new("96", "Invalid signature"));
    }
    Ok(signed)
}

async fn rest(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }
    let rsp = match dispatch(&state, &params).await {
        Ok(mut payload) => {
            payload.insert("stat".to_string(), json!("ok"));
            Value::Object(payload)
        }
        Err(Fail(code, msg)) => json!({"stat": "fail", "err": {"code": code, "msg": msg}}),
    };
    Json(json!({ "rsp": rsp }))
}

async fn dispatch(state: &AppState, params: &HashMap<String, String>) -> Result<Map<String, Value>, Fail> {
    let params = verify(&state.config, params)?;
    let method = params.get("method").map(String::as_str).unwrap_or_default();
    let mut out = Map::new();
    match method {
        "rtm.test.echo" => {
            for (k, v) in &params {
                out.insert(k.clone(), json!(v));
            }
        }
        "rtm.auth.getFrob" => {
            let frob = Uuid::new_v4().simple().to_string();
            state.db.write().await.frobs.insert(frob.clone(), None);
            out.insert("frob".to_string(), json!(frob));
        }
        "rtm.auth.getToken" => {
            let frob = params.get("frob").cloned().unwrap_or_default();
            let mut db = state.db.write().await;
            let perms = match db.frobs.get(&frob) {
                Some(Some(perms)) => perms.clone(),
                _ => return Err(Fail::new("101", "Invalid frob - did you authenticate?")),
            };
            db.frobs.remove(&frob);
            let token = Uuid::new_v4().simple().to_string();
            let grant = Grant {
                perms,
                user: demo_user(),
            };
            db.tokens.insert(token.clone(), grant.clone());
            out.insert("auth".to_string(), auth_json(&token, &grant));
        }
        "rtm.auth.checkToken" => {
            let (token, grant) = lookup_grant(state, &params).await?;
            out.insert("auth".to_string(), auth_json(&token, &grant));
        }
        "rtm.test.login" => {
            let (_, grant) = lookup_grant(state, &params).await?;
            out.insert(
                "user".to_string(),
                json!({"id": grant.user.id, "username": grant.user.username}),
            );
        }
        "rtm.timelines.create" => {
            lookup_grant(state, &params).await?;
            let mut db = state.db.write().await;
            db.timelines += 1;
            out.insert("timeline".to_string(), json!((12741020 + db.timelines).to_string()));
        }
        other => return Err(Fail::new("112", format!("Method \"{other}\" not found"))),
    }
    Ok(out)
}

async fn lookup_grant(state: &AppState, params: &BTreeMap<String, String>) -> Result<(String, Grant), Fail> {
    let token = params.get("auth_token").cloned().unwrap_or_default();
    let db = state.db.read().await;
    db.tokens
        .get(&token)
        .cloned()
        .map(|grant| (token, grant))
        .ok_or_else(|| Fail::new("98", "Login failed / Invalid auth token"))
}

fn auth_json(token: &str, grant: &Grant) -> Value {
    json!({"token": token, "perms": grant.perms, "user": grant.user})
}

/// Stands in for the user approving the frob in a browser.
async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<&'static str, (StatusCode, String)> {
    let params = verify(&state.config, &params)
        .map_err(|Fail(code, msg)| (StatusCode::BAD_REQUEST, format!("{code}: {msg}")))?;
    let perms = match params.get("perms").map(String::as_str) {
        Some(p @ ("read" | "write" | "delete")) => p.to_string(),
        _ => return Err((StatusCode::BAD_REQUEST, "invalid perms".to_string())),
    };
    let frob = params.get("frob").cloned().unwrap_or_default();
    let mut db = state.db.write().await;
    match db.frobs.get_mut(&frob) {
        Some(slot) => {
            *slot = Some(perms);
            Ok("Application successfully authorized")
        }
        None => Err((StatusCode::NOT_FOUND, "unknown frob".to_string())),
    }
}
