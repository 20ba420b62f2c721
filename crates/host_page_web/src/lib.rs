//! Browser adapters implementing the `host_page` contracts against the real
//! DOM.
//!
//! Everything here requires a live browser document and is therefore only
//! compiled for `wasm32`; native builds get signature-compatible stubs that
//! report the capability as unavailable, so the workspace builds and tests
//! everywhere.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

#[cfg(target_arch = "wasm32")]
mod alert;
#[cfg(target_arch = "wasm32")]
mod document;
#[cfg(target_arch = "wasm32")]
mod files;
#[cfg(target_arch = "wasm32")]
mod node;
#[cfg(target_arch = "wasm32")]
mod schedule;

#[cfg(target_arch = "wasm32")]
pub use alert::WebAlertService;
#[cfg(target_arch = "wasm32")]
pub use document::{browser_page_services, WebDocument};
#[cfg(target_arch = "wasm32")]
pub use files::WebFileBundle;
#[cfg(target_arch = "wasm32")]
pub use node::WebNode;
#[cfg(target_arch = "wasm32")]
pub use schedule::WebScheduler;

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(not(target_arch = "wasm32"))]
pub use non_wasm::browser_page_services;
