//! Commands module - service layer for managed policy attachment lifecycle

mod apply;
mod delete;
pub(crate) mod plan;
mod read;
pub(crate) mod service;

pub use plan::compute_delta;
pub use service::PolicyAttachmentsService;
