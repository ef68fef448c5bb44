//! Wire types for the Beeper Desktop API.
//!
//! Every field is decoded leniently: a missing, `null` or mistyped value falls
//! back to its default instead of failing the whole item, so a page keeps its
//! message count even when the remote API drifts.

mod account;
mod chat;
mod de;
mod message;
mod page;

pub use account::{Account, ConnectionInfo};
pub use chat::{Chat, ChatFilter, sort_by_last_activity};
pub use message::{Attachment, AttachmentKind, Dimensions, Direction, Message};
pub use page::Page;

pub(crate) use page::page_from_value;
