//! Gateway wire types
//!
//! - `request`: inbound DTOs and the [`ValidatedJson`] extractor
//! - `response`: the `{code, msg, data}` envelope, [`ApiError`] and outbound DTOs

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
