//! Noctis: select text, click the popover, read the translation.
//!
//! The crate is split between a host-agnostic core (selection tracking,
//! popover placement, translation sessions) and the pieces around it: the
//! gateway providers that actually translate, and the configuration and
//! logging the desktop host uses.

pub mod config;
pub mod gateway;
pub mod geometry;
pub mod host;
pub mod languages;
pub mod logger;
pub mod overlay;
pub mod popover;
pub mod selection;
pub mod session;

pub use overlay::Overlay;
