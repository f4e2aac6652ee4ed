use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";
pub const DEMO_STUDENT_ID: &str = "20240001";
pub const DEMO_PASSWORD: &str = "correct horse";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub student_id: String,
    pub email: String,
    pub name: String,
    pub contact: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

struct Account {
    profile: Profile,
    password: String,
}

#[derive(Clone)]
pub struct AppState {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    sessions: Arc<RwLock<HashMap<Uuid, String>>>,
}

impl AppState {
    fn seeded() -> Self {
        let demo = Account {
            profile: Profile {
                student_id: DEMO_STUDENT_ID.to_string(),
                email: "demo@example.edu".to_string(),
                name: "Demo Student".to_string(),
                contact: String::new(),
            },
            password: DEMO_PASSWORD.to_string(),
        };
        let accounts = HashMap::from([(DEMO_STUDENT_ID.to_string(), demo)]);
        Self {
            accounts: Arc::new(RwLock::new(accounts)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Student id of the session named by the request's cookie, if any.
    async fn session_user(&self, headers: &HeaderMap) -> Option<String> {
        let token = session_token(headers)?;
        self.sessions.read().await.get(&token).cloned()
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/protected", get(protected))
        .route("/api/user/me", get(get_me).put(update_me))
        .route("/api/profile", get(get_me))
        .route("/debug/headers", get(echo_headers))
        .with_state(AppState::seeded())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn register(State(state): State<AppState>, Json(input): Json<RegisterRequest>) -> Response {
    let required = [&input.student_id, &input.email, &input.name, &input.password];
    if required.iter().any(|field| field.is_empty()) {
        return bad_request("missing required field");
    }

    let mut accounts = state.accounts.write().await;
    if accounts.contains_key(&input.student_id) {
        return bad_request("student id already registered");
    }
    if accounts.values().any(|a| a.profile.email == input.email) {
        return bad_request("email already registered");
    }

    info!(student_id = %input.student_id, "account registered");
    let account = Account {
        profile: Profile {
            student_id: input.student_id.clone(),
            email: input.email,
            name: input.name,
            contact: input.contact,
        },
        password: input.password,
    };
    accounts.insert(input.student_id, account);
    Json(serde_json::json!({ "message": "registered" })).into_response()
}

async fn login(State(state): State<AppState>, Json(input): Json<LoginRequest>) -> Response {
    let accounts = state.accounts.read().await;
    match accounts.get(&input.student_id) {
        Some(account) if account.password == input.password => {
            let token = Uuid::new_v4();
            state
                .sessions
                .write()
                .await
                .insert(token, account.profile.student_id.clone());
            info!(student_id = %input.student_id, "login succeeded");
            let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax");
            let body = LoginResponse {
                message: "logged in".to_string(),
                name: account.profile.name.clone(),
            };
            ([(header::SET_COOKIE, cookie)], Json(body)).into_response()
        }
        _ => {
            info!(student_id = %input.student_id, "login rejected");
            unauthorized("invalid student id or password")
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.write().await.remove(&token);
    }
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0");
    let body = serde_json::json!({ "message": "logged out" });
    ([(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

async fn protected(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.session_user(&headers).await {
        Some(_) => Json(serde_json::json!({ "message": "you are logged in" })).into_response(),
        None => unauthorized("login required"),
    }
}

async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(student_id) = state.session_user(&headers).await else {
        return unauthorized("login required");
    };
    let accounts = state.accounts.read().await;
    match accounts.get(&student_id) {
        Some(account) => Json(account.profile.clone()).into_response(),
        None => unauthorized("login required"),
    }
}

async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<UpdateProfile>,
) -> Response {
    let Some(student_id) = state.session_user(&headers).await else {
        return unauthorized("login required");
    };
    let mut accounts = state.accounts.write().await;
    let Some(account) = accounts.get_mut(&student_id) else {
        return unauthorized("login required");
    };
    if let Some(email) = input.email {
        account.profile.email = email;
    }
    if let Some(name) = input.name {
        account.profile.name = name;
    }
    if let Some(contact) = input.contact {
        account.profile.contact = contact;
    }
    Json(account.profile.clone()).into_response()
}

async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let echoed = headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), value)
        })
        .collect();
    Json(echoed)
}

fn bad_request(message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn unauthorized(message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, token)| token.parse().ok())
}
