//! # chat2blog-core
//!
//! Core logic for turning chat media into blog posts.
//!
//! This crate provides:
//! - **Media aggregation** - walks chat history in bounded batches and
//!   collects image and video attachments
//! - **Media cache** - memoized downloads keyed by media handle
//! - **Idempotent import** - each remote media handle becomes at most one
//!   local asset (`SQLite`-backed)
//! - **Post composition** - block markup for galleries, images and videos
//! - **Credential storage** - the access token in the system keyring
//! - **Admin surface** - envelope-returning operations for a media browser

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admin;
pub mod aggregator;
pub mod cache;
pub mod compose;
pub mod credentials;
pub mod data_url;
mod error;
pub mod import;
mod source;

pub use admin::{AdminService, Envelope, PostMedia, PostRequest};
pub use aggregator::{AggregateStats, AggregatorConfig, MediaAggregator, MediaItem, MediaPage};
pub use cache::{CachedSource, MediaCache};
pub use compose::PostFormat;
pub use credentials::{CredentialError, CredentialResult};
pub use error::{Error, Result};
pub use import::{
    AssetId, ImportRecord, ImportRepository, ImportRequest, ImportedAsset, MediaImporter,
    MediaLibrary,
};
pub use source::{MediaSource, MessageSource};
