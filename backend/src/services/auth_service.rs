use std::sync::{Arc, OnceLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::store::JsonFileStore;

const MIN_PASSWORD_LEN: usize = 6;

/// JWT payload handed to clients after register/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<JsonFileStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<JsonFileStore>, secret: &[u8], token_ttl: Duration) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl,
        }
    }

    /// Creates an account with a zero balance and signs the new user in.
    pub fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let (Some(name), Some(email), Some(password)) = (request.name, request.email, request.password) else {
            return Err(AppError::Validation("Name, email, and password are required".into()));
        };
        let name = name.trim().to_string();
        let email = email.trim().to_string();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("Name, email, and password are required".into()));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email format".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if self.store.read(|db| db.find_user_by_email(&email).is_some()) {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }

        let password_hash = hash_password(&password)?;
        let user = self.store.write(|db| {
            if db.find_user_by_email(&email).is_some() {
                return Err(AppError::Conflict("User with this email already exists".into()));
            }
            let user = db.insert_user(User::new(name, &email, BigDecimal::from(0)));
            db.set_credential(&user.email, password_hash);
            Ok(user)
        })?;

        info!("Registered user {} ({})", user.id, user.email);
        let token = self.issue_token(&user)?;
        Ok(AuthResponse { user, token })
    }

    pub fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AppError::Validation("Email and password are required".into()));
        };
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Email and password are required".into()));
        }

        let (user, stored_hash) = self.store.read(|db| {
            let user = db.find_user_by_email(&email).cloned();
            let hash = db.credential(&email).map(str::to_string);
            (user, hash)
        });
        let (Some(user), Some(stored_hash)) = (user, stored_hash) else {
            warn!("Login rejected for unknown account {}", email.trim());
            return Err(invalid_credentials());
        };
        if !verify_password(&password, &stored_hash) {
            warn!("Login rejected for user {}: wrong password", user.id);
            return Err(invalid_credentials());
        }

        info!("User {} logged in", user.id);
        let token = self.issue_token(&user)?;
        Ok(AuthResponse { user, token })
    }

    /// Resolves a bearer token to the stored user it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.verify_token(token)?;
        self.store
            .read(|db| db.get_user(claims.sub).cloned())
            .ok_or_else(|| AppError::Unauthenticated("User not found".into()))
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthenticated("Invalid token".into()))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid credentials".into())
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
        .is_match(email)
}

/// Argon2id hash in PHC string form with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}
