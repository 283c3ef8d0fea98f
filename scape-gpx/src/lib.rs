//! # Scape GPX Library (scape-gpx)
//!
//! GPX track replay and recording.
//!
//! **Purpose:** Read GPX 1.1 documents (with Garmin and Soundscape point
//! extensions), replay them as a live location, course and heading source, and
//! record live fixes back into GPX files.
//!
//! **Architecture:** [`simulator::GpxSimulator`] walks a [`document::GpxDocument`]
//! point by point on one-shot Tokio timers and broadcasts
//! [`provider::SensorEvent`]s to its subscribers. Consumers only depend on the
//! [`provider::LocationProvider`] trait, so a live GPS source can stand in for it.

pub mod document;
pub mod error;
pub mod files;
pub mod index;
pub mod parser;
pub mod provider;
pub mod significant;
pub mod simulator;
pub mod tracker;
pub mod writer;

pub use document::{GpxDocument, GpxLocation, GpxTrackPoint};
pub use error::{Error, Result};
pub use index::GpxIndex;
pub use provider::{LocationProvider, SensorEvent, SimulatedActivity};
pub use simulator::{GpxSimulator, SimulatorSettings};
