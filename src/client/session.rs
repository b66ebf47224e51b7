// Client session state machine

use crate::auth::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::client::api::ApiClient;
use crate::client::error::ClientError;
use crate::client::routes::{guard, Route, RouteDecision};
use crate::client::store::{SessionStore, StoredSession};
use crate::users::UserResponse;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    Loading,
    Authenticated(UserResponse),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn user(&self) -> Option<&UserResponse> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Keeps the stored tokens, the session state and the current route in step
///
/// Every authenticated call goes through [`SessionManager::intercept`]: a 401
/// clears the session and sends the user to the login page unless they are
/// already on an auth page.
pub struct SessionManager<S: SessionStore> {
    api: ApiClient,
    store: S,
    state: SessionState,
    current_route: Route,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(api: ApiClient, store: S) -> Self {
        Self {
            api,
            store,
            state: SessionState::Unauthenticated,
            current_route: Route::Login,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_route(&self) -> Route {
        self.current_route
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn access_token(&self) -> Option<String> {
        self.stored().map(|s| s.access_token)
    }

    fn stored(&self) -> Option<StoredSession> {
        self.store.load().ok().flatten().filter(StoredSession::is_usable)
    }

    /// Restores a previous session from the store
    pub async fn restore(&mut self) -> &SessionState {
        let session = match self.store.load() {
            Ok(Some(session)) if session.is_usable() => session,
            Ok(_) => {
                self.clear_store();
                self.state = SessionState::Unauthenticated;
                return &self.state;
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                self.clear_store();
                self.state = SessionState::Unauthenticated;
                return &self.state;
            }
        };

        self.state = SessionState::Loading;
        match self.api.me(&session.access_token).await {
            Ok(user) => {
                let refreshed = StoredSession {
                    user: Some(user.clone()),
                    ..session
                };
                if let Err(e) = self.store.save(&refreshed) {
                    tracing::warn!("Failed to persist refreshed profile: {}", e);
                }
                self.state = SessionState::Authenticated(user);
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Stored session rejected by server");
                self.force_logout();
            }
            Err(e) => match session.user {
                Some(user) if e.is_transport() => {
                    tracing::warn!("Server unreachable, using cached profile: {}", e);
                    self.state = SessionState::Authenticated(user);
                }
                _ => {
                    tracing::warn!("Could not restore session: {}", e);
                    self.clear_store();
                    self.state = SessionState::Unauthenticated;
                }
            },
        }
        &self.state
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserResponse, ClientError> {
        self.state = SessionState::Loading;
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.api.login(&request).await;
        self.finish_sign_in(result)
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<UserResponse, ClientError> {
        self.state = SessionState::Loading;
        let result = self.api.register(request).await;
        self.finish_sign_in(result)
    }

    fn finish_sign_in(
        &mut self,
        result: Result<AuthResponse, ClientError>,
    ) -> Result<UserResponse, ClientError> {
        let auth = match result {
            Ok(auth) => auth,
            Err(e) => {
                self.state = SessionState::Unauthenticated;
                return Err(e);
            }
        };

        let session = StoredSession {
            access_token: auth.access_token,
            refresh_token: Some(auth.refresh_token),
            user: Some(auth.user.clone()),
        };
        if let Err(e) = self.store.save(&session) {
            self.state = SessionState::Unauthenticated;
            return Err(e);
        }

        self.state = SessionState::Authenticated(auth.user.clone());
        self.current_route = Route::Dashboard;
        Ok(auth.user)
    }

    /// Client-side logout: the server keeps no token state to revoke
    pub fn logout(&mut self) {
        self.clear_store();
        self.state = SessionState::Unauthenticated;
        self.current_route = Route::Login;
    }

    /// Tells the server before clearing the local session
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn sign_out(&mut self) {
        if let Some(token) = self.access_token() {
            if let Err(e) = self.api.logout(&token).await {
                tracing::debug!("Server logout failed: {}", e);
            }
        }
        self.logout();
    }

    /// Exchanges the stored refresh token for a new pair
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let session = self.stored().ok_or(ClientError::NoSession)?;
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.force_logout();
            return Err(ClientError::NoSession);
        };

        match self.api.refresh(&refresh_token).await {
            Ok(pair) => {
                self.store.save(&StoredSession {
                    access_token: pair.access_token,
                    refresh_token: Some(pair.refresh_token),
                    user: session.user,
                })?;
                Ok(())
            }
            Err(e) => {
                self.force_logout();
                Err(e)
            }
        }
    }

    /// Reloads the profile through the authenticated `me` endpoint
    pub async fn fetch_profile(&mut self) -> Result<UserResponse, ClientError> {
        let token = self.access_token().ok_or(ClientError::NoSession)?;
        let result = self.api.me(&token).await;
        let user = self.intercept(result)?;

        if let Some(mut session) = self.stored() {
            session.user = Some(user.clone());
            self.store.save(&session)?;
        }
        self.state = SessionState::Authenticated(user.clone());
        Ok(user)
    }

    /// Applies the 401 rule to the outcome of an authenticated call
    pub fn intercept<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            if e.is_unauthorized() && !self.current_route.is_auth_page() {
                tracing::info!("Session expired, signing out");
                self.force_logout();
            }
        }
        result
    }

    pub fn force_logout(&mut self) {
        self.logout();
    }

    /// Navigation by URL path, as a browser location would arrive
    pub fn open(&mut self, path: &str) -> RouteDecision {
        self.navigate(Route::from_path(path))
    }

    /// Runs the route guard and moves to wherever it lands
    pub fn navigate(&mut self, route: Route) -> RouteDecision {
        let decision = guard(route, &self.state);
        match decision {
            RouteDecision::Render => self.current_route = route,
            RouteDecision::Redirect(target) => self.current_route = target,
            RouteDecision::ShowLoading => {}
        }
        decision
    }

    fn clear_store(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear session storage: {}", e);
        }
    }
}
