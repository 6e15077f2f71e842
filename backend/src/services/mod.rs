pub mod change_feed;
pub mod identity;
pub mod unread;

pub use change_feed::{ChangeFeed, FeedEvent, MessageFilter, Subscription};
pub use identity::{AuthSession, GoTrueClient, Identity, IdentityError, IdentityProvider, SignUpMetadata};
pub use unread::{unread_status, UnreadStatus};
