//! Core composer configuration
//!
//! The unified configuration types live in [`config`]; the file-format
//! plumbing they rely on lives in [`crate::config`].

pub mod config;
