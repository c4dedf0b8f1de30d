//! Internal implementation modules.
//!
//! These are not part of the public API and may change without notice.

pub(crate) mod link;
pub(crate) mod template;
