//! Source tree watcher with debouncing and async event streaming.
//!
//! This crate provides file change detection via the `notify` crate with
//! debouncing through `notify-debouncer-mini`, bridged to an async tokio
//! context for the change orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Blocking Thread (spawn_blocking)             │
//! │  ┌──────────────────┐    ┌────────────────┐    ┌────────────┐  │
//! │  │ RecommendedWatcher│ -> │ Debouncer      │ -> │ Callback   │  │
//! │  │ (notify)         │    │ (100ms window) │    │ (tracking) │  │
//! │  └──────────────────┘    └────────────────┘    └─────┬──────┘  │
//! └──────────────────────────────────────────────────────│─────────┘
//!                                                        │
//!                                          blocking_send │
//!                                                        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                        │
//! │  ┌──────────────────┐    ┌────────────────┐                     │
//! │  │ FileWatcher      │    │ mpsc::Receiver │ -> Orchestrator     │
//! │  │ (shutdown ctrl)  │    │ (WatchEvent)   │                     │
//! │  └──────────────────┘    └────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use hl_watcher::{FileWatcher, SourceFilter};
//! use hl_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), hl_watcher::WatchError> {
//! let config = WatchConfig::default();
//! let root = Utf8Path::new("./src");
//! let filter = SourceFilter::new(root, &config.source_extension);
//!
//! let mut watcher = FileWatcher::new(root, &config, filter).await?;
//! while let Some(event) = watcher.recv().await {
//!     println!("Modified: {}", event.path);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
mod tracker;
pub mod watcher;

pub use error::WatchError;
pub use events::{ChangeKind, WatchEvent};
pub use filter::{ExtensionFilter, FileFilter, HiddenPathFilter, SourceFilter};
pub use watcher::FileWatcher;
