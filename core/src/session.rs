//! Session state: the token and the identity decoded from it.
//!
//! # Design
//! `Session` is an explicit value owned by the caller (usually
//! `WarehouseApi`), not a global. The only invariant is that an identity
//! never outlives its token: every path that drops the token drops the
//! user too.

use tracing::{debug, info};

use crate::error::ApiError;
use crate::jwt::TokenDecoder;
use crate::navigation::Navigation;
use crate::storage::TokenStore;
use crate::types::User;

/// Header carrying the session token on every authenticated request.
pub const TOKEN_HEADER: &str = "token";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session holding `token` with no identity decoded yet.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Load the token from storage if none is held, then decode the identity.
    ///
    /// Fails with `Unauthenticated` when there is still no token and the
    /// caller is not already on the login view. On the login view the
    /// request goes out without a token.
    pub fn ensure_token(
        &mut self,
        store: &dyn TokenStore,
        key: &str,
        current_path: &str,
        login_path: &str,
        decoder: &dyn TokenDecoder,
    ) -> Result<(), ApiError> {
        if self.token.is_none() {
            self.token = store.get(key).filter(|t| !t.is_empty());
        }
        if self.token.is_none() && current_path != login_path {
            debug!(current_path, "no session token, redirecting to login");
            return Err(ApiError::Unauthenticated);
        }
        if self.user.is_none() {
            self.decode_identity(decoder);
        }
        Ok(())
    }

    /// Decode and cache the identity if a token is held and none is cached.
    /// A token that fails to decode leaves the identity absent.
    pub fn decode_identity(&mut self, decoder: &dyn TokenDecoder) {
        let Some(token) = self.token.as_deref() else {
            return;
        };
        if self.user.is_some() {
            return;
        }
        match decoder.decode(token) {
            Ok(claims) => self.user = Some(claims.payload),
            Err(err) => debug!(error = %err, "session token did not decode"),
        }
    }

    /// Persist `token`, hold it, and decode its identity.
    pub fn establish(
        &mut self,
        token: String,
        store: &mut dyn TokenStore,
        key: &str,
        decoder: &dyn TokenDecoder,
    ) -> Result<(), ApiError> {
        store.set(key, &token)?;
        self.token = Some(token);
        self.user = None;
        self.decode_identity(decoder);
        info!(
            login = self.user.as_ref().map(|u| u.login.as_str()),
            "session established"
        );
        Ok(())
    }

    /// Drop the token and identity and remove the persisted token.
    ///
    /// The in-memory state is cleared even when storage fails, so a broken
    /// store cannot keep a rejected token alive for the next request.
    pub fn clear(&mut self, store: &mut dyn TokenStore, key: &str) -> Result<Navigation, ApiError> {
        self.token = None;
        self.user = None;
        store.remove(key)?;
        Ok(Navigation::Login)
    }

    /// Header set for a request: empty without a token, else the token header.
    pub fn headers(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) => vec![(TOKEN_HEADER.to_string(), token.clone())],
            None => Vec::new(),
        }
    }

    /// `headers()` plus the JSON content type, for requests with a body.
    pub fn json_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        headers.extend(self.headers());
        headers
    }
}
