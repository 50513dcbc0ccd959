//! Per-tab session state machine: `Unknown` until the bootstrap resolves,
//! then `Anonymous` or `Authenticated`. No single storage location is
//! trusted exclusively, and the user profile is always fetched fresh rather
//! than read out of token claims.

use time::OffsetDateTime;
use tracing::debug;

use crate::auth::validate::{is_valid_email, MIN_PASSWORD_LEN};
use crate::session::api::AuthBackend;
use crate::session::error::SessionError;
use crate::session::store::TokenStore;
use crate::session::token::is_expired;
use crate::users::dto::UserOut;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Anonymous,
    Authenticated(UserOut),
}

pub struct Session<B, S> {
    backend: B,
    store: S,
    state: SessionState,
    loading: bool,
}

impl<B: AuthBackend, S: TokenStore> Session<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            state: SessionState::Unknown,
            loading: true,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_user(&self) -> Option<&UserOut> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.get()
    }

    /// Resolves the session from whatever token is stored. Idempotent: it
    /// mutates nothing except clearing invalid credentials, so a second run
    /// reaches the same state. The loading flag is false on every exit.
    pub async fn bootstrap(&mut self) {
        self.loading = true;
        self.state = self.bootstrap_inner().await;
        self.loading = false;
    }

    async fn bootstrap_inner(&mut self) -> SessionState {
        let Some(token) = self.store.get() else {
            return SessionState::Anonymous;
        };

        if is_expired(&token, OffsetDateTime::now_utc().unix_timestamp()) {
            // Expired or undecodable: clean up without a doomed fetch.
            debug!("stored token expired, clearing");
            self.store.clear();
            return SessionState::Anonymous;
        }

        match self.backend.current_user(&token).await {
            Ok(user) => SessionState::Authenticated(user),
            Err(e) => {
                // Terminal for this pass, no retry.
                debug!(error = %e, "profile fetch failed, clearing credentials");
                self.store.clear();
                SessionState::Anonymous
            }
        }
    }

    /// Exchanges credentials for a token, stores it, then fetches the
    /// profile fresh. A failed exchange leaves state and stores untouched.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<UserOut, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "Username and password are required.".into(),
            ));
        }
        self.loading = true;
        let result = self.login_inner(username, password).await;
        self.loading = false;
        result
    }

    async fn login_inner(&mut self, username: &str, password: &str) -> Result<UserOut, SessionError> {
        let token = self.backend.login(username, password).await?;
        self.store.set(&token.access_token);

        match self.backend.current_user(&token.access_token).await {
            Ok(user) => {
                self.state = SessionState::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.store.clear();
                self.state = SessionState::Anonymous;
                Err(e)
            }
        }
    }

    /// Unconditional; cannot fail, makes no network call.
    pub fn logout(&mut self) {
        self.store.clear();
        self.state = SessionState::Anonymous;
        self.loading = false;
    }

    /// Creates an account without establishing a session; the caller logs
    /// in separately. Validation mirrors the registration form.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<UserOut, SessionError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(SessionError::Validation("Username is required.".into()));
        }
        if email.is_empty() {
            return Err(SessionError::Validation("Email is required.".into()));
        }
        if !is_valid_email(email) {
            return Err(SessionError::Validation(
                "Please enter a valid email address.".into(),
            ));
        }
        if password != confirm_password {
            return Err(SessionError::Validation("Passwords do not match.".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(SessionError::Validation(
                "Password must be at least 3 characters long.".into(),
            ));
        }
        self.backend.register(username, email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::TokenResponse;
    use crate::session::store::{DualTokenStore, MemoryTokenStore};
    use crate::session::token::make_unsigned_token;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn alice() -> UserOut {
        UserOut {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            is_admin: false,
            is_active: true,
        }
    }

    /// Scripted backend that records every call it receives.
    struct MockBackend {
        login_result: Result<TokenResponse, SessionError>,
        me_result: Result<UserOut, SessionError>,
        calls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn new(
            login_result: Result<TokenResponse, SessionError>,
            me_result: Result<UserOut, SessionError>,
        ) -> Self {
            Self {
                login_result,
                me_result,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn happy() -> Self {
            Self::new(
                Ok(TokenResponse {
                    access_token: "abc.def.ghi".into(),
                    token_type: "bearer".into(),
                    user_id: 1,
                    username: "alice".into(),
                    is_admin: false,
                }),
                Ok(alice()),
            )
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthBackend for MockBackend {
        async fn login(
            &self,
            _username: &str,
            _password: &str,
        ) -> Result<TokenResponse, SessionError> {
            self.calls.lock().unwrap().push("login".into());
            self.login_result.clone()
        }

        async fn register(
            &self,
            _username: &str,
            _email: &str,
            _password: &str,
        ) -> Result<UserOut, SessionError> {
            self.calls.lock().unwrap().push("register".into());
            Ok(alice())
        }

        async fn current_user(&self, _token: &str) -> Result<UserOut, SessionError> {
            self.calls.lock().unwrap().push("me".into());
            self.me_result.clone()
        }
    }

    fn dual_store_with(token: Option<&str>) -> DualTokenStore<MemoryTokenStore, MemoryTokenStore> {
        let mut store = DualTokenStore::new(MemoryTokenStore::default(), MemoryTokenStore::default());
        if let Some(t) = token {
            store.set(t);
        }
        store
    }

    fn future_exp() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp() + 3600
    }

    fn past_exp() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp() - 3600
    }

    #[tokio::test]
    async fn bootstrap_without_token_is_anonymous_without_network() {
        let mut session = Session::new(MockBackend::happy(), dual_store_with(None));
        assert_eq!(session.state(), &SessionState::Unknown);
        assert!(session.is_loading());

        session.bootstrap().await;

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(!session.is_loading());
        assert!(session.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_with_expired_token_clears_both_stores_without_fetching() {
        let token = make_unsigned_token(past_exp());
        let mut session = Session::new(MockBackend::happy(), dual_store_with(Some(&token)));

        session.bootstrap().await;

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.store.primary.get(), None);
        assert_eq!(session.store.secondary.get(), None);
        assert!(session.backend.calls().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn bootstrap_with_malformed_token_is_treated_as_expired() {
        let mut session = Session::new(MockBackend::happy(), dual_store_with(Some("garbage")));
        session.bootstrap().await;
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.stored_token(), None);
        assert!(session.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_with_valid_token_authenticates() {
        let token = make_unsigned_token(future_exp());
        let mut session = Session::new(MockBackend::happy(), dual_store_with(Some(&token)));

        session.bootstrap().await;

        assert_eq!(session.state(), &SessionState::Authenticated(alice()));
        assert_eq!(session.backend.calls(), vec!["me"]);
        assert_eq!(session.stored_token(), Some(token));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn bootstrap_profile_fetch_failure_clears_stores() {
        for failure in [
            SessionError::InvalidCredentials,
            SessionError::Rejected("server error".into()),
            SessionError::Network,
        ] {
            let token = make_unsigned_token(future_exp());
            let backend = MockBackend::new(Err(SessionError::Network), Err(failure));
            let mut session = Session::new(backend, dual_store_with(Some(&token)));

            session.bootstrap().await;

            assert_eq!(session.state(), &SessionState::Anonymous);
            assert_eq!(session.stored_token(), None);
            assert!(!session.is_loading());
        }
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let token = make_unsigned_token(future_exp());
        let mut session = Session::new(MockBackend::happy(), dual_store_with(Some(&token)));

        session.bootstrap().await;
        let first = session.state().clone();
        session.bootstrap().await;

        assert_eq!(session.state(), &first);
        assert_eq!(session.stored_token(), Some(token));
    }

    #[tokio::test]
    async fn login_stores_the_token_in_both_backings_and_authenticates() {
        let mut session = Session::new(MockBackend::happy(), dual_store_with(None));

        let user = session.login("alice", "secret").await.expect("login");

        assert_eq!(user, alice());
        assert_eq!(session.state(), &SessionState::Authenticated(alice()));
        assert_eq!(session.store.primary.get(), Some("abc.def.ghi".into()));
        assert_eq!(session.store.secondary.get(), Some("abc.def.ghi".into()));
        assert_eq!(session.backend.calls(), vec!["login", "me"]);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn failed_login_leaves_state_and_stores_untouched() {
        let backend = MockBackend::new(Err(SessionError::InvalidCredentials), Ok(alice()));
        let mut session = Session::new(backend, dual_store_with(None));
        session.bootstrap().await;

        let err = session.login("alice", "wrong").await.unwrap_err();

        assert_eq!(err, SessionError::InvalidCredentials);
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.stored_token(), None);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn login_with_failing_profile_fetch_rolls_back_the_token() {
        let backend = MockBackend::new(
            Ok(TokenResponse {
                access_token: "abc.def.ghi".into(),
                token_type: "bearer".into(),
                user_id: 1,
                username: "alice".into(),
                is_admin: false,
            }),
            Err(SessionError::Network),
        );
        let mut session = Session::new(backend, dual_store_with(None));

        let err = session.login("alice", "secret").await.unwrap_err();

        assert_eq!(err, SessionError::Network);
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.stored_token(), None);
    }

    #[tokio::test]
    async fn login_rejects_empty_fields_before_any_request() {
        let mut session = Session::new(MockBackend::happy(), dual_store_with(None));
        let err = session.login("", "secret").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert!(session.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_both_stores_without_network() {
        let token = make_unsigned_token(future_exp());
        let mut session = Session::new(MockBackend::happy(), dual_store_with(Some(&token)));
        session.bootstrap().await;
        assert!(session.current_user().is_some());
        let calls_before = session.backend.calls().len();

        session.logout();

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.store.primary.get(), None);
        assert_eq!(session.store.secondary.get(), None);
        assert_eq!(session.backend.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn register_rejects_a_two_character_password_without_network() {
        let session = Session::new(MockBackend::happy(), dual_store_with(None));

        let err = session
            .register("bob", "bob@example.com", "ab", "ab")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::Validation("Password must be at least 3 characters long.".into())
        );
        assert!(session.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn register_validates_in_form_order() {
        let session = Session::new(MockBackend::happy(), dual_store_with(None));

        let err = session.register("", "", "a", "b").await.unwrap_err();
        assert_eq!(err, SessionError::Validation("Username is required.".into()));

        let err = session.register("bob", "", "a", "b").await.unwrap_err();
        assert_eq!(err, SessionError::Validation("Email is required.".into()));

        let err = session.register("bob", "not-an-email", "a", "b").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Validation("Please enter a valid email address.".into())
        );

        let err = session
            .register("bob", "bob@example.com", "abc", "abd")
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Validation("Passwords do not match.".into()));
    }

    #[tokio::test]
    async fn register_does_not_establish_a_session() {
        let mut session = Session::new(MockBackend::happy(), dual_store_with(None));
        session.bootstrap().await;

        session
            .register("bob", "bob@example.com", "abc", "abc")
            .await
            .expect("register");

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.stored_token(), None);
        assert_eq!(session.backend.calls(), vec!["register"]);
    }
}
