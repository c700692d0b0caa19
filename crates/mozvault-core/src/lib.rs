//! # mozvault-core
//!
//! Core library for the mozvault CLI providing:
//! - The error taxonomy shared by every mozvault crate
//! - Application-type definitions (Firefox, Thunderbird, ...)
//! - Profile lock-file detection

pub mod apptype;
pub mod error;
pub mod lock;

pub use apptype::AppType;
pub use error::{Error, Result};
pub use lock::{find_lock, is_locked, LOCK_FILES};
