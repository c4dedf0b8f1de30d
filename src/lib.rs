// lank - atomic symlink retargeting
// MIT OR Apache-2.0, 2025

//! Atomically retarget symbolic links.
//!
//! This library provides:
//! - Atomic retargeting of a single symlink (temporary link + rename)
//! - Regex substitution over a symlink's current target
//! - Batch retargeting of many symlinks with per-link error reporting
//!
//! # Example: Retarget one link
//!
//! ```no_run
//! use camino::Utf8Path;
//!
//! lank::retarget(Utf8Path::new("/srv/app/current"), "releases/42")?;
//! # Ok::<(), lank::Error>(())
//! ```
//!
//! # Example: Rewrite many links
//!
//! ```no_run
//! use lank::Batch;
//!
//! let batch = Batch::builder()
//!     .pattern(r"python3\.(\d+)")
//!     .replacement("python3.12")
//!     .build()?;
//! let report = batch.run(&["/usr/local/bin/python3", "/usr/local/bin/pip3"]);
//! for outcome in &report {
//!     println!("{}", outcome);
//! }
//! # Ok::<(), lank::Error>(())
//! ```

mod internal;

pub mod batch;
pub mod error;
pub mod pattern;
pub mod retarget;

pub use batch::{retarget_many, Batch, BatchReport, Change, Outcome};
pub use error::Error;
pub use pattern::{compute_new_target, Substitution};
pub use retarget::{point, retarget, PointAction, Retarget};
