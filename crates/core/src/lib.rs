#![forbid(unsafe_code)]

pub mod dag;
pub mod model;

/// Reserved id for the implicit root of every item's version history.
/// Never assigned to a persisted version.
pub const ROOT_VERSION_ID: i64 = 0;
