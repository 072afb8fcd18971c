//! REST adapter for the remote content service.

mod client;
mod models;

pub use client::RemoteContentService;
