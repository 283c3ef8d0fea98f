//! # Scape Common Library
//!
//! Shared code for the spatial callout workspace including:
//! - Error type and result alias
//! - TOML bootstrap configuration and config file resolution
//! - Geodesy helpers (coordinates, locations, bearings, distances)
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod geo;
pub mod time;

pub use error::{Error, Result};
pub use geo::{Coordinate, Location};
