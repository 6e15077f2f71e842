pub mod connections;
pub mod messages;
pub mod profiles;
pub mod tables;

pub use connections::{Connection, ConnectionRequest, ConnectionWithPeer, IncomingRequest, RequestStatus};
pub use messages::{Delivery, Message, MessageThread, NewMessage, ReadCursor};
pub use profiles::{Profile, ProfileUpdate, SkillLevel};
pub use tables::{PingPongTable, TableForm};
