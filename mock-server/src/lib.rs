use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{ser::Serializer, Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MAX_SECRET_LEN: usize = 250;
pub const DEFAULT_EXPIRE: &str = "3d";
pub const DEFAULT_TRIES: i64 = 5;
pub const DEFAULT_DAYS: i64 = 3;

/// Accepted `expire` values and their length in minutes.
pub const EXPIRE_CHOICES: [(&str, i64); 10] = [
    ("10m", 10),
    ("30m", 30),
    ("1h", 60),
    ("3h", 180),
    ("6h", 360),
    ("1d", 1440),
    ("2d", 2880),
    ("3d", 4320),
    ("5d", 7200),
    ("7d", 10080),
];

/// Stand-in for the breached-password lookup.
pub const BREACHED_PASSPHRASES: [&str; 4] =
    ["Password123", "Passw0rd1234", "Welcome2020", "Qwerty123456"];

pub const MISSING_FIELD: &str = "Missing data for required field.";
pub const WEAK_PASSPHRASE: &str = "Sorry, your passphrase is too weak. It needs minimum 8 characters, with 1 number and 1 uppercase.";
pub const BREACHED_PASSPHRASE: &str = "Sorry, this passphrase has appeared in a data breach, please choose another one.";
pub const SECRET_NOT_FOUND: &str =
    "Sorry, we can't find a secret, it has expired, been deleted or has already been read.";

#[derive(Clone, Debug)]
pub struct StoredSecret {
    pub secret: String,
    pub passphrase: String,
    pub expires_at: OffsetDateTime,
    pub tries_left: i64,
}

pub type Db = Arc<RwLock<HashMap<String, StoredSecret>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    public_url: Arc<str>,
}

impl AppState {
    pub fn new(public_url: &str) -> Self {
        Self {
            db: Arc::new(RwLock::new(HashMap::new())),
            public_url: Arc::from(public_url.trim_end_matches('/')),
        }
    }

    fn link(&self, slug: &str) -> String {
        format!("{}/r/{slug}", self.public_url)
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CreateSecret {
    pub secret: String,
    pub passphrase: String,
    pub expire: Option<String>,
    pub tries: Option<i64>,
    pub haveibeenpwned: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LegacyCreateSecret {
    pub secret: String,
    pub passphrase: String,
    pub days: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ReadSecret {
    pub slug: String,
    pub passphrase: String,
}

/// Field name to messages, serialized in insertion order.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<(&'static str, Vec<String>)>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        match self.0.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.0.push((field, vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn first_message(&self) -> Option<&str> {
        self.0
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(field, messages)| (field, messages)))
    }
}

#[derive(Serialize)]
pub struct Envelope {
    pub response: Reply,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Created {
        details: &'static str,
        slug: String,
        link: String,
        expires_on: String,
    },
    Success {
        msg: String,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Details>,
    },
    Expired {
        msg: String,
    },
    Invalid {
        msg: String,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum Details {
    Message(String),
    Json { json: FieldErrors },
    Query { query: FieldErrors },
}

type ApiReply = (StatusCode, Json<Envelope>);

fn reply(status: StatusCode, response: Reply) -> ApiReply {
    (status, Json(Envelope { response }))
}

pub fn app(public_url: &str) -> Router {
    app_with_state(AppState::new(public_url))
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/api/secret", get(read_secret).post(create_secret))
        .route("/api/c", post(legacy_create_secret))
        .route("/api/r", get(legacy_read_secret))
        .with_state(state)
}

/// Serve on `listener`, minting links under the listener's own address.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    axum::serve(listener, app(&format!("http://{addr}"))).await
}

pub fn is_strong_passphrase(passphrase: &str) -> bool {
    passphrase.chars().count() >= 8
        && passphrase.chars().any(|c| c.is_ascii_digit())
        && passphrase.chars().any(|c| c.is_uppercase())
}

fn validate_secret_and_passphrase(
    errors: &mut FieldErrors,
    secret: &str,
    passphrase: &str,
    check_breached: bool,
) {
    if secret.is_empty() {
        errors.push("secret", MISSING_FIELD);
    } else if secret.chars().count() > MAX_SECRET_LEN {
        errors.push("secret", format!("Longer than maximum length {MAX_SECRET_LEN}."));
    }

    if passphrase.is_empty() {
        errors.push("passphrase", MISSING_FIELD);
    } else if !is_strong_passphrase(passphrase) {
        errors.push("passphrase", WEAK_PASSPHRASE);
    } else if check_breached && BREACHED_PASSPHRASES.contains(&passphrase) {
        errors.push("passphrase", BREACHED_PASSPHRASE);
    }
}

fn expire_minutes(expire: &str) -> Option<i64> {
    EXPIRE_CHOICES
        .iter()
        .find(|(token, _)| *token == expire)
        .map(|(_, minutes)| *minutes)
}

fn format_expiry(at: OffsetDateTime) -> String {
    format!(
        "{}-{:02}-{:02} at {:02}:{:02} UTC",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute()
    )
}

async fn store(state: &AppState, secret: String, passphrase: String, minutes: i64, tries: i64) -> Reply {
    let slug = Uuid::new_v4().simple().to_string();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(minutes);
    state.db.write().await.insert(
        slug.clone(),
        StoredSecret {
            secret,
            passphrase,
            expires_at,
            tries_left: tries,
        },
    );
    Reply::Created {
        details: "Secret successfully created.",
        link: state.link(&slug),
        slug,
        expires_on: format_expiry(expires_at),
    }
}

async fn create_secret(State(state): State<AppState>, body: String) -> ApiReply {
    let mut errors = FieldErrors::default();
    let Ok(input) = serde_json::from_str::<CreateSecret>(&body) else {
        errors.push("_schema", "Invalid input type.");
        return reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            Reply::Error {
                msg: None,
                details: Some(Details::Json { json: errors }),
            },
        );
    };

    validate_secret_and_passphrase(&mut errors, &input.secret, &input.passphrase, input.haveibeenpwned);

    let expire = input.expire.as_deref().unwrap_or(DEFAULT_EXPIRE);
    let minutes = expire_minutes(expire);
    if minutes.is_none() {
        let choices: Vec<&str> = EXPIRE_CHOICES.iter().map(|(token, _)| *token).collect();
        errors.push("expire", format!("Must be one of: {}.", choices.join(", ")));
    }

    let tries = input.tries.unwrap_or(DEFAULT_TRIES);
    if !(3..=10).contains(&tries) {
        errors.push(
            "tries",
            "Must be greater than or equal to 3 and less than or equal to 10.",
        );
    }

    match minutes {
        Some(minutes) if errors.is_empty() => {
            let created = store(&state, input.secret, input.passphrase, minutes, tries).await;
            reply(StatusCode::CREATED, created)
        }
        _ => reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            Reply::Error {
                msg: None,
                details: Some(Details::Json { json: errors }),
            },
        ),
    }
}

/// Older create endpoint: `days` instead of `expire`, one flat error string,
/// always HTTP 200.
async fn legacy_create_secret(State(state): State<AppState>, body: String) -> ApiReply {
    let input = serde_json::from_str::<LegacyCreateSecret>(&body).unwrap_or_default();
    let mut errors = FieldErrors::default();
    validate_secret_and_passphrase(&mut errors, &input.secret, &input.passphrase, false);

    let days = input.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=7).contains(&days) {
        errors.push("days", "The number of days must be between 1 and 7.");
    }

    if let Some(message) = errors.first_message() {
        let message = message.to_string();
        return reply(
            StatusCode::OK,
            Reply::Error {
                msg: None,
                details: Some(Details::Message(message)),
            },
        );
    }

    let created = store(&state, input.secret, input.passphrase, days * 24 * 60, DEFAULT_TRIES).await;
    reply(StatusCode::OK, created)
}

enum ReadResult {
    Revealed(String),
    Missing(FieldErrors),
    NotFound,
    WrongPassphrase { tries_left: i64 },
}

async fn consume(state: &AppState, input: ReadSecret) -> ReadResult {
    let mut errors = FieldErrors::default();
    if input.slug.is_empty() {
        errors.push("slug", MISSING_FIELD);
    }
    if input.passphrase.is_empty() {
        errors.push("passphrase", MISSING_FIELD);
    }
    if !errors.is_empty() {
        return ReadResult::Missing(errors);
    }

    let mut db = state.db.write().await;
    let Some(stored) = db.get_mut(&input.slug) else {
        return ReadResult::NotFound;
    };
    if stored.expires_at <= OffsetDateTime::now_utc() {
        db.remove(&input.slug);
        return ReadResult::NotFound;
    }
    if stored.passphrase != input.passphrase {
        stored.tries_left -= 1;
        let tries_left = stored.tries_left;
        if tries_left <= 0 {
            db.remove(&input.slug);
        }
        return ReadResult::WrongPassphrase { tries_left };
    }

    match db.remove(&input.slug) {
        Some(stored) => ReadResult::Revealed(stored.secret),
        None => ReadResult::NotFound,
    }
}

fn wrong_passphrase_message(tries_left: i64) -> String {
    if tries_left <= 0 {
        "Sorry, the passphrase is not valid. The secret has been permanently deleted.".to_string()
    } else {
        format!("Sorry, the passphrase is not valid. Number of tries remaining: {tries_left}")
    }
}

async fn read_secret(State(state): State<AppState>, Query(input): Query<ReadSecret>) -> ApiReply {
    match consume(&state, input).await {
        ReadResult::Revealed(secret) => reply(StatusCode::OK, Reply::Success { msg: secret }),
        ReadResult::Missing(errors) => reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            Reply::Error {
                msg: None,
                details: Some(Details::Query { query: errors }),
            },
        ),
        ReadResult::NotFound => reply(
            StatusCode::NOT_FOUND,
            Reply::Expired {
                msg: SECRET_NOT_FOUND.to_string(),
            },
        ),
        ReadResult::WrongPassphrase { tries_left } => reply(
            StatusCode::UNAUTHORIZED,
            Reply::Invalid {
                msg: wrong_passphrase_message(tries_left),
            },
        ),
    }
}

/// Older read endpoint: every failure is a 200 `error` with a `msg`.
async fn legacy_read_secret(State(state): State<AppState>, Query(input): Query<ReadSecret>) -> ApiReply {
    let failure = |msg: String| {
        reply(
            StatusCode::OK,
            Reply::Error {
                msg: Some(msg),
                details: None,
            },
        )
    };
    match consume(&state, input).await {
        ReadResult::Revealed(secret) => reply(StatusCode::OK, Reply::Success { msg: secret }),
        ReadResult::Missing(errors) => {
            failure(errors.first_message().unwrap_or(MISSING_FIELD).to_string())
        }
        ReadResult::NotFound => failure(SECRET_NOT_FOUND.to_string()),
        ReadResult::WrongPassphrase { tries_left } => failure(wrong_passphrase_message(tries_left)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_serialize_in_insertion_order() {
        let mut errors = FieldErrors::default();
        errors.push("tries", "bad tries");
        errors.push("passphrase", "weak");
        errors.push("passphrase", "breached");
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"tries":["bad tries"],"passphrase":["weak","breached"]}"#);
    }

    #[test]
    fn reply_serializes_status_tag() {
        let json = serde_json::to_value(Envelope {
            response: Reply::Expired {
                msg: "gone".to_string(),
            },
        })
        .unwrap();
        assert_eq!(json["response"]["status"], "expired");
        assert_eq!(json["response"]["msg"], "gone");
    }

    #[test]
    fn error_reply_omits_absent_fields() {
        let json = serde_json::to_value(Reply::Error {
            msg: None,
            details: Some(Details::Message("flat".to_string())),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "error", "details": "flat"}));
    }

    #[test]
    fn passphrase_strength() {
        assert!(is_strong_passphrase("Hunter2Hunter2"));
        assert!(!is_strong_passphrase("short1A"));
        assert!(!is_strong_passphrase("nouppercase123"));
        assert!(!is_strong_passphrase("NoDigitsHere"));
    }

    #[test]
    fn create_secret_defaults() {
        let input: CreateSecret = serde_json::from_str(r#"{"secret":"s"}"#).unwrap();
        assert_eq!(input.secret, "s");
        assert!(input.passphrase.is_empty());
        assert!(input.expire.is_none());
        assert!(input.tries.is_none());
        assert!(!input.haveibeenpwned);
    }

    #[test]
    fn expiry_format() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(format_expiry(at), "2023-11-14 at 22:13 UTC");
    }

    #[test]
    fn expire_lookup() {
        assert_eq!(expire_minutes("1h"), Some(60));
        assert_eq!(expire_minutes("4d"), None);
    }
}
