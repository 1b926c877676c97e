//! Pure transformations for link resolution.
//!
//! Nothing in this module performs I/O; the effects layer feeds it page
//! bodies and URLs it has already fetched.

mod href;
mod join;

pub use href::extract_hrefs;
pub use join::join_href;
