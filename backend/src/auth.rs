use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::AppState;

const MAX_SESSIONS: usize = 10000;
const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;
const CREDENTIAL_BYTES: usize = 32;

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Issues and resolves opaque bearer tokens. Tokens are random bytes; no
/// claims, no expiry encoded in the token itself. Route handlers only ever
/// see the resolved user id.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Uuid>>,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rng: SystemRandom::new(),
        }
    }

    pub fn rng(&self) -> &SystemRandom {
        &self.rng
    }

    fn cleanup_old_sessions(&self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if sessions.len() > MAX_SESSIONS {
                sessions.clear();
            }
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.cleanup_old_sessions();
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill(&mut bytes)
            .map_err(|_| ApiError::Internal("failed to generate session token".into()))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(token.clone(), user_id);
            debug!("Issued session token");
            Ok(token)
        } else {
            error!("Failed to acquire lock for session storage");
            Err(ApiError::Internal("session storage unavailable".into()))
        }
    }

    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        self.sessions.lock().ok()?.get(token).copied()
    }
}

pub fn hash_password(rng: &SystemRandom, password: &str) -> Result<String, ApiError> {
    let mut salt = [0u8; SALT_BYTES];
    rng.fill(&mut salt)
        .map_err(|_| ApiError::Internal("failed to generate salt".into()))?;

    let mut derived = [0u8; CREDENTIAL_BYTES];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, PBKDF2_ITERATIONS, &salt, password.as_bytes(), &mut derived);

    Ok(format!("{}${}", URL_SAFE_NO_PAD.encode(salt), URL_SAFE_NO_PAD.encode(derived)))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt, derived)) = stored.split_once('$') else { return false };
    let (Ok(salt), Ok(derived)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(derived))
    else { return false };

    pbkdf2::verify(pbkdf2::PBKDF2_HMAC_SHA256, PBKDF2_ITERATIONS, &salt, password.as_bytes(), &derived).is_ok()
}

/// Request guard for the protected routes: resolves the `Authorization:
/// Bearer` header to a stable user id or fails the request with 401.
pub struct AuthenticatedUser {
    pub id: Uuid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = req.headers().get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "));
        let Some(token) = token else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let state = match req.guard::<&State<AppState>>().await {
            Outcome::Success(state) => state,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        match state.sessions.resolve(token) {
            Some(id) => Outcome::Success(AuthenticatedUser { id }),
            None => {
                debug!("Bearer token did not resolve to a session");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}
