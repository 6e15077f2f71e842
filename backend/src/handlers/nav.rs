use serde::Serialize;

use crate::constants::{DASHBOARD_ROUTE, LOGIN_ROUTE, SIGNUP_ROUTE};

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Navbar {
    pub authenticated: bool,
    pub home: &'static str,
    pub links: Vec<NavLink>,
    /// Present only for signed-in users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout: Option<&'static str>,
}

const AUTHENTICATED_LINKS: [(&str, &str); 5] = [
    ("Home", DASHBOARD_ROUTE),
    ("Find Players", "/players"),
    ("Find Tables", "/tables"),
    ("Messages", "/messaging"),
    ("Profile", "/profile"),
];

impl Navbar {
    pub fn authenticated(current_path: &str) -> Self {
        Self {
            authenticated: true,
            home: DASHBOARD_ROUTE,
            links: AUTHENTICATED_LINKS
                .iter()
                .map(|&(label, href)| NavLink { label, href, active: href == current_path })
                .collect(),
            logout: Some("/api/auth/logout"),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            home: "/",
            links: vec![
                NavLink { label: "Log In", href: LOGIN_ROUTE, active: false },
                NavLink { label: "Sign Up", href: SIGNUP_ROUTE, active: false },
            ],
            logout: None,
        }
    }
}
