//! Identity store: the session state machine.
//!
//! `Anonymous -> login/register -> Authenticated -> logout -> Anonymous`.
//! Login hydrates the user's saved cart before returning; registration does
//! not, since a freshly issued id has nothing saved yet. There is no
//! re-entrancy guard, so overlapping calls interleave at their await points.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use storefront_sync_core::{
    Email, EmailError, HydrationStatus, PasswordError, SessionStatus, UserId, validate_password,
};

use crate::config::Latency;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::CurrentUser;
use crate::persistence::{CartScope, PersistenceGateway, StorageError, keys};
use crate::stores::CartStore;

/// Id handed to every successful login.
const LOGIN_USER_ID: &str = "1";

/// Errors from login and registration.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username is required")]
    MissingUsername,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid password: {0}")]
    InvalidPassword(#[from] PasswordError),

    /// The session could not be persisted.
    #[error("could not save session: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Default)]
struct IdentityState {
    user: Option<CurrentUser>,
    is_authenticated: bool,
    in_flight: usize,
    error: Option<String>,
}

/// Background cart hydration started by [`IdentityStore::check_auth`].
#[derive(Debug)]
pub struct HydrationHandle {
    user_id: UserId,
    task: JoinHandle<HydrationStatus>,
}

impl HydrationHandle {
    /// User whose cart is being loaded.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Whether the hydration has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the hydration to settle.
    pub async fn wait(self) -> HydrationStatus {
        match self.task.await {
            Ok(status) => status,
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Cart hydration task failed");
                HydrationStatus::Failed
            }
        }
    }
}

/// Session state and the cart lifecycle tied to it.
pub struct IdentityStore {
    state: RwLock<IdentityState>,
    cart: Arc<CartStore>,
    gateway: Arc<dyn PersistenceGateway>,
    latency: Latency,
}

impl IdentityStore {
    #[must_use]
    pub fn new(cart: Arc<CartStore>, gateway: Arc<dyn PersistenceGateway>, latency: Latency) -> Self {
        Self {
            state: RwLock::new(IdentityState::default()),
            cart,
            gateway,
            latency,
        }
    }

    /// Sign in with the fixed test identity.
    ///
    /// Succeeds when `username` is non-empty and `password` has at least four
    /// characters. On success the session is persisted and the user's saved
    /// cart is loaded before returning. The cart is only bound to the user's
    /// scope once that load settles.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` on invalid credentials or if the session could not
    /// be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser, AuthError> {
        self.begin();
        tokio::time::sleep(self.latency.auth).await;

        let result = self.start_session(username, password);
        let user = self.settle(result)?;

        let status = self.load_user_cart(&user.id).await;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        add_breadcrumb("auth", "Logged in", Some(&[("user_id", user.id.as_str())]));
        info!(user_id = %user.id, hydration = ?status, "Login succeeded");
        Ok(user)
    }

    fn start_session(&self, username: &str, password: &str) -> Result<CurrentUser, AuthError> {
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        validate_password(password)?;

        let user = CurrentUser {
            id: UserId::new(LOGIN_USER_ID),
            username: username.to_string(),
            email: Email::for_username(username),
        };
        self.persist_session(&user)?;
        Ok(user)
    }

    /// Create an account and sign it in.
    ///
    /// The new id is derived from the current time. The user's cart scope is
    /// bound but nothing is hydrated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if any field is invalid or the session could not
    /// be persisted.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        self.begin();
        tokio::time::sleep(self.latency.auth).await;

        let result = self.create_account(username, email, password);
        let user = self.settle(result)?;

        self.cart.rebind(user.id.clone().into());

        set_sentry_user(&user.id, Some(user.email.as_str()));
        add_breadcrumb("auth", "Registered", Some(&[("user_id", user.id.as_str())]));
        info!(user_id = %user.id, "Registration succeeded");
        Ok(user)
    }

    fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let user = CurrentUser {
            id: UserId::new(chrono::Utc::now().timestamp_millis().to_string()),
            username: username.to_string(),
            email,
        };
        self.persist_session(&user)?;
        Ok(user)
    }

    /// End the session.
    ///
    /// An active user's cart is saved under their key first. The session is
    /// cleared and the cart emptied whether or not that save succeeded.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.begin();
        tokio::time::sleep(self.latency.sync).await;

        let user = self.read().user.clone();
        if let Some(user) = &user {
            self.save_user_cart(&user.id).await;
        }

        {
            let mut state = self.write();
            state.user = None;
            state.is_authenticated = false;
            state.error = None;
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        for key in [keys::USER, keys::IS_AUTHENTICATED] {
            if let Err(e) = self.gateway.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }

        // rebind first so the empty snapshot lands on the anonymous key
        self.cart.rebind(CartScope::Anonymous);
        self.cart.clear_cart();

        clear_sentry_user();
        if let Some(user) = user {
            add_breadcrumb("auth", "Logged out", Some(&[("user_id", user.id.as_str())]));
            info!(user_id = %user.id, "Logged out");
        }
    }

    /// Rehydrate the session from persistence.
    ///
    /// When a session is found its saved cart is loaded in the background and
    /// the cart is bound to the user once that load settles; the returned
    /// handle resolves at that point. Returns `None` when there is no
    /// persisted session.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while a session is persisted.
    pub fn check_auth(&self) -> Option<HydrationHandle> {
        if self.gateway.get(keys::IS_AUTHENTICATED).as_deref() != Some("true") {
            return None;
        }
        let saved = self.gateway.get(keys::USER)?;
        let user: CurrentUser = match serde_json::from_str(&saved) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                return None;
            }
        };

        {
            let mut state = self.write();
            state.user = Some(user.clone());
            state.is_authenticated = true;
        }
        set_sentry_user(&user.id, Some(user.email.as_str()));
        info!(user_id = %user.id, "Session restored");

        let cart = Arc::clone(&self.cart);
        let user_id = user.id.clone();
        let task = tokio::spawn(async move { cart.sync_cart_with_server(&user_id).await });
        Some(HydrationHandle {
            user_id: user.id,
            task,
        })
    }

    /// Load `user_id`'s saved cart. Failures are logged only.
    pub async fn load_user_cart(&self, user_id: &UserId) -> HydrationStatus {
        self.cart.sync_cart_with_server(user_id).await
    }

    /// Save the cart under `user_id`. Failures are logged only.
    pub async fn save_user_cart(&self, user_id: &UserId) {
        self.cart.save_cart_to_server(user_id).await;
    }

    fn persist_session(&self, user: &CurrentUser) -> Result<(), AuthError> {
        let json = serde_json::to_string(user).map_err(StorageError::from)?;
        self.gateway.set(keys::USER, &json)?;
        self.gateway.set(keys::IS_AUTHENTICATED, "true")?;

        let mut state = self.write();
        state.user = Some(user.clone());
        state.is_authenticated = true;
        Ok(())
    }

    fn begin(&self) {
        let mut state = self.write();
        state.in_flight += 1;
        state.error = None;
    }

    fn settle<T>(&self, result: Result<T, AuthError>) -> Result<T, AuthError> {
        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        if let Err(e) = &result {
            warn!(error = %e, "Authentication failed");
            state.error = Some(e.to_string());
        }
        result
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Current user, if signed in.
    #[must_use]
    pub fn user(&self) -> Option<CurrentUser> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.is_logged_in() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    /// Authenticated and holding a user.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        let state = self.read();
        state.is_authenticated && state.user.is_some()
    }

    /// Username, or empty when anonymous.
    #[must_use]
    pub fn username(&self) -> String {
        self.read()
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    /// Email, or empty when anonymous.
    #[must_use]
    pub fn user_email(&self) -> String {
        self.read()
            .user
            .as_ref()
            .map(|u| u.email.as_str().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().in_flight > 0
    }

    /// Message from the latest failed login or registration.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, IdentityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IdentityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
