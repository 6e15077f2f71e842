// =============================================================================
// SpinSync Backend Constants
// =============================================================================
// Tunables and user-facing copy used throughout the backend, kept in one
// place so screens and handlers agree on wording.

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default maximum pool size for the relational store
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "spinsync=info,tower_http=debug,server=debug";

// =============================================================================
// REALTIME
// =============================================================================

/// Buffered message events per change-feed subscriber before it starts lagging
pub const CHANGE_FEED_CAPACITY: usize = 256;

// =============================================================================
// ACCOUNTS & PROFILES
// =============================================================================

/// Minimum password length accepted on sign-up and login
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Rating every new profile starts with
pub const DEFAULT_RATING: i64 = 1000;

// =============================================================================
// CONNECTIONS
// =============================================================================

/// Message attached to every connection request sent from the player directory
pub const DEFAULT_CONNECTION_MESSAGE: &str = "Hey! Let's play some ping pong together!";

/// How many pending requests the dashboard previews
pub const DASHBOARD_REQUEST_PREVIEW: i64 = 3;

// =============================================================================
// TABLES
// =============================================================================

/// Coordinates stored for every table until geocoding exists
pub const PLACEHOLDER_LATITUDE: f64 = 0.0;
pub const PLACEHOLDER_LONGITUDE: f64 = 0.0;

// =============================================================================
// ROUTES
// =============================================================================

pub const AUTH_ROUTE: &str = "/auth";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const SIGNUP_ROUTE: &str = "/auth?mode=signup";
pub const LOGIN_ROUTE: &str = "/auth?mode=login";

// =============================================================================
// USER-FACING COPY
// =============================================================================

pub const EMPTY_TABLES_MESSAGE: &str = "No tables found yet. Be the first to add one!";
pub const EMPTY_PLAYERS_MESSAGE: &str = "No players found. Try adjusting your search.";
pub const EMPTY_REQUESTS_MESSAGE: &str = "No pending requests";
pub const REQUESTS_HEADLINE: &str = "Players who want to connect with you";
pub const NO_CONNECTION_SELECTED_MESSAGE: &str = "Select a connection to start messaging";
