pub mod auth;
pub mod dashboard;
pub mod forms;
pub mod landing;
pub mod messaging;
pub mod nav;
pub mod players;
pub mod profile;
pub mod tables;

pub use auth::{auth_page, login, logout, sign_up};
pub use dashboard::{accept_request, dashboard};
pub use landing::landing;
pub use messaging::{messaging_page, send, thread, thread_ws, unread, unread_ws};
pub use players::{players_page, send_request};
pub use profile::{profile_page, update_profile};
pub use tables::{create_table, delete_table, tables_page, update_table};

pub async fn health_check() -> &'static str {
    "OK"
}
