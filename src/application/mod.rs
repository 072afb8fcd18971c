//! Application layer: the post form and its submission workflow.

pub mod error;
pub mod form;
pub mod lifecycle;
pub mod ports;
pub mod submission;
