//! Accounts and bearer-token authentication.
//!
//! Passwords are stored as `sha256(salt || password)` with a per-user random
//! salt. Login and signup hand out an HS256 JWT whose `sub` is the user id;
//! every user-scoped endpoint resolves the caller through [`AuthUser`].
//!
//! WebSocket clients cannot set headers from the browser, so `/ws` also
//! accepts the token as `?token=`.

use std::sync::Arc;

use axum::{
  async_trait,
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct User {
  pub id: String,
  pub email: String,
  pub full_name: String,
  salt: String,
  password_hash: Vec<u8>,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn new(email: &str, full_name: &str, password: &str) -> Self {
    let salt = Uuid::new_v4().to_string();
    Self {
      id: Uuid::new_v4().to_string(),
      email: email.to_string(),
      full_name: full_name.to_string(),
      password_hash: hash_password(&salt, password),
      salt,
      created_at: Utc::now(),
    }
  }

  pub fn verify_password(&self, password: &str) -> bool {
    hash_password(&self.salt, password) == self.password_hash
  }
}

fn hash_password(salt: &str, password: &str) -> Vec<u8> {
  let mut hasher = Sha256::new();
  hasher.update(salt.as_bytes());
  hasher.update(password.as_bytes());
  hasher.finalize().to_vec()
}

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String, // user id
  pub email: String,
  pub iat: usize,
  pub exp: usize,
}

pub fn create_token(secret: &str, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
  let now = Utc::now();
  let claims = Claims {
    sub: user.id.clone(),
    email: user.email.clone(),
    iat: now.timestamp() as usize,
    exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
  };
  encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
  let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())?;
  Ok(data.claims)
}

/// Authenticated caller, resolved from `Authorization: Bearer <jwt>`.
#[derive(Clone, Debug)]
pub struct AuthUser {
  pub user_id: String,
  pub email: String,
}

/// Resolve a raw token to a known user.
pub async fn user_from_token(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
  let claims = validate_token(&state.jwt_secret, token)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;
  let user = state
    .user_by_id(&claims.sub)
    .await
    .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))?;
  Ok(AuthUser { user_id: user.id, email: user.email })
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided".into()))?;
    user_from_token(state, token).await
  }
}
