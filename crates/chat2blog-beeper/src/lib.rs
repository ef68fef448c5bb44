//! # chat2blog-beeper
//!
//! Client for the Beeper Desktop API, the local REST service that exposes a
//! user's chats across every connected messaging network.
//!
//! ## Features
//!
//! - **Chats**: list chats sorted by last activity, optionally only groups
//! - **Messages**: page through a chat's history with an opaque cursor
//! - **Media**: download attachments by their `mxc://` handle
//! - **Health check**: count connected accounts and networks
//!
//! ## Quick Start
//!
//! ```ignore
//! use chat2blog_beeper::{BeeperClient, ClientConfig, Direction};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BeeperClient::new(ClientConfig::local()?)?.with_token("token");
//!
//!     let chats = client.list_chats(200).await?;
//!     let first = &chats.items[0];
//!
//!     let page = client
//!         .get_chat_messages(&first.id, None, None, Direction::Before)
//!         .await?;
//!     println!("{} messages, more: {}", page.items.len(), page.has_more);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
pub mod media;
pub mod types;

pub use client::BeeperClient;
pub use config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use media::{HandleScheme, MediaBlob};
pub use types::{
    Account, Attachment, AttachmentKind, Chat, ChatFilter, ConnectionInfo, Dimensions, Direction,
    Message, Page,
};
