//! Release packaging
//!
//! - **archive**: zip a built integration directory and digest the result
//! - **packager**: locate a released version in git history, check it out,
//!   validate, mark it custom, archive it and restore the working tree

pub mod archive;
pub mod packager;

pub use packager::{PackageFailure, PackageReport, PackageRequest, Packager, RestoreReport};
