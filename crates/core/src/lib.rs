//! # hydrocheck Core
//!
//! Core types for validating the topological and elevation consistency
//! of hydrographic vector networks.
//!
//! This crate provides:
//! - `Vertex` / `GeometryZ`: 3D vector geometry with planar predicates
//! - `Feature` / `Layer` / `Dataset`: the read-once geometry source
//! - `SpatialIndex` / `IndexSet`: advisory per-layer R-tree indexes
//! - `ControlConfig`: tolerances and layer adjacency configuration
//! - `Finding` / `ReportSink`: structured findings and CSV reporting

pub mod config;
pub mod error;
pub mod geometry;
pub mod index;
pub mod report;
pub mod vector;

pub use config::ControlConfig;
pub use error::{Error, Result};
pub use geometry::{GeometryZ, Vertex};
pub use index::{IndexSet, SpatialIndex};
pub use report::{Category, CsvSink, Finding, MemorySink, ReportSink};
pub use vector::{AttributeValue, Dataset, Feature, Layer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ControlConfig;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{GeometryZ, Vertex};
    pub use crate::index::{IndexSet, SpatialIndex};
    pub use crate::report::{Category, CsvSink, Finding, MemorySink, ReportSink};
    pub use crate::vector::{AttributeValue, Dataset, Feature, Layer};
}
