//! # cirrus-limiter
//!
//! Deterministic size limiting of page documents.
//!
//! [`resize`] truncates a [`Document`](cirrus_types::Document) so that its
//! estimated serialized size fits a [`SizeLimiterProfile`](cirrus_types::SizeLimiterProfile)
//! budget without breaking its structure:
//! - hard per-field caps are always applied
//! - configured fields are shortened toward a minimum, in order, only while
//!   the document is oversize
//! - keyword fields lose whole elements, text fields lose trailing characters
//! - statistics are returned and stored in the document's hints

pub mod error;
pub mod limiter;
pub mod profiles;
pub mod stats;
mod truncate;

pub use error::LimiterError;
pub use limiter::{estimate_size, resize, SizeLimiter};
pub use profiles::ProfileSet;
pub use stats::{Pass, SizeLimiterStats};
pub use truncate::{ceil_char_boundary, floor_char_boundary};
