use axum::Json;
use serde::Serialize;

use crate::constants::SIGNUP_ROUTE;

use super::nav::Navbar;

#[derive(Debug, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CallToAction {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LandingPage {
    pub nav: Navbar,
    pub headline: &'static str,
    pub tagline: &'static str,
    pub actions: Vec<CallToAction>,
    pub features: Vec<Feature>,
}

pub async fn landing() -> Json<LandingPage> {
    Json(LandingPage {
        nav: Navbar::anonymous(),
        headline: "Find Your Perfect Ping Pong Partner",
        tagline: "Connect with players in your area, discover tables, and never play alone again.",
        actions: vec![
            CallToAction { label: "Get Started", href: SIGNUP_ROUTE },
            CallToAction { label: "Learn More", href: SIGNUP_ROUTE },
        ],
        features: vec![
            Feature {
                title: "Find Players",
                description: "Browse players by skill level and city, then send a connection request.",
            },
            Feature {
                title: "Discover Tables",
                description: "Share and find public and private tables near you.",
            },
            Feature {
                title: "Stay in Touch",
                description: "Message your connections to set up your next match.",
            },
        ],
    })
}
