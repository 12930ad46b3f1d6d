//! Text report renderer for hookscope call ledgers.
//!
//! Turns a [`LedgerSnapshot`](hs_common::LedgerSnapshot) into plain text:
//! one section per bucket in fixed order (native callables, foreign
//! callables, native objects, foreign objects), each either a "none"
//! marker or its entries with one line per recorded call.
//!
//! # Example
//!
//! ```
//! use hs_common::LedgerSnapshot;
//! use hs_report::ReportRenderer;
//!
//! let text = ReportRenderer::default().render(&LedgerSnapshot::default());
//! assert!(text.starts_with("Suspected native injected functions: none"));
//! ```

pub mod args;
pub mod render;

pub use args::{render_args, render_timestamp};
pub use render::ReportRenderer;
