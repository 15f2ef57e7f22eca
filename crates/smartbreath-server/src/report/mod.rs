//! Report generation for measurement records.
//!
//! Consumes a fully-resolved record + machine aggregate (plus the owner, when
//! one exists) and renders a single-page PDF summary. Rendering failures are
//! their own error type, mapped by the gRPC layer to an internal error
//! distinct from data errors.

mod pdf;

pub use pdf::{ReportError, render_record_report};
