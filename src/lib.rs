//! A post list backed by a JSON feed.
//!
//! The feed document lists posts (title, description, image path). The
//! [`adapter::PostListAdapter`] fetches it once on construction, exposes the
//! posts as rows to a render surface, and lazily fetches each bound row's
//! image. Failures are logged and degrade to an empty list or a fallback image.
//!
//! - [`post`] - The post record
//! - [`feed`] - Feed document client and parser
//! - [`image`] - Per-row image loader
//! - [`adapter`] - Row model, view bindings, event delivery
//! - [`config`] - Optional TOML configuration
//! - [`http`] - The shared HTTP client
//! - [`ui`] - Terminal render surface

pub mod adapter;
pub mod config;
pub mod feed;
pub mod http;
pub mod image;
pub mod post;
pub mod ui;
