//! # Urban Eye
//!
//! Profile page logic for the Urban Eye civic issue tracker.
//!
//! The crate is split into the [`Repository`], which plays the part of the managed backend
//! (profile records, issues and blob storage), and the headless page logic that the GUI and CLI
//! render: the [`header`] editor, the [`posts`] feed and the [`page`] composition.

pub mod backend;
pub mod fs;
pub mod header;
pub mod page;
pub mod posts;
pub mod repository;

mod error;

pub use error::{Error, Result};
pub use repository::Repository;
