//! Typed host-page contracts and shared models used across the overlay
//! runtime and browser adapters.
//!
//! This crate is the API-first boundary for everything the overlay needs
//! from the page it is injected into. It exposes document/element capability
//! traits (including the interception-strategy surface), timer, alert,
//! remote-picker, and resource contracts, plus in-memory adapters, while the
//! concrete browser adapters live in `host_page_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod alert;
pub mod dom;
pub mod files;
pub mod memory;
pub mod picker;
pub mod resources;
pub mod schedule;
pub mod services;

pub use alert::{AlertService, MemoryAlertService, NoopAlertService};
pub use dom::{
    ChangeHook, ClickDisposition, ClickHook, CreationHook, NodeHandle, PageDocument, PageNode,
    RemovalHook,
};
pub use files::{FileBundle, FileStat, MemoryFileBundle};
pub use memory::{as_memory, MemoryDocument, MemoryNode};
pub use picker::{
    NoopRemotePicker, PickHandler, QueuedRemotePicker, RemoteFileHandle, RemoteFilePicker,
};
pub use resources::{IconKey, ResourceProvider, StaticResources, TemplateKey};
pub use schedule::{ManualScheduler, NoopScheduler, RepeatGuard, Scheduler};
pub use services::PageServices;
