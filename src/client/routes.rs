// Route guards for frontends driven by the session manager

use crate::client::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Unknown paths and `/` land on the dashboard, like the SPA's catch-all
    pub fn from_path(path: &str) -> Route {
        let path = path.trim_end_matches('/');
        if path.ends_with("/login") || path == "login" {
            Route::Login
        } else if path.ends_with("/register") || path == "register" {
            Route::Register
        } else {
            Route::Dashboard
        }
    }

    /// Login and registration pages
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// What to do with a navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    ShowLoading,
    Redirect(Route),
}

pub fn guard(route: Route, state: &SessionState) -> RouteDecision {
    if state.is_loading() {
        return RouteDecision::ShowLoading;
    }
    match (route.is_protected(), state.is_authenticated()) {
        (true, false) => RouteDecision::Redirect(Route::Login),
        (false, true) => RouteDecision::Redirect(Route::Dashboard),
        _ => RouteDecision::Render,
    }
}
