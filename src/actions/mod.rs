//! File actions module.
//!
//! The delete module removes the duplicates chosen by the resolver:
//! - Dry run by default, reporting what would be removed
//! - Permanent deletion with `--remove`
//! - Size re-verification immediately before each unlink
//!
//! ```no_run
//! use dupcull::actions::{remove_duplicates, DeleteConfig};
//! # let groups: Vec<dupcull::duplicates::DuplicateGroup> = Vec::new();
//!
//! let report = remove_duplicates(&groups, &DeleteConfig::remove()).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod delete;

pub use delete::{remove_duplicates, remove_file, DeleteConfig, DeleteError, DeleteResult, RemovalReport};
