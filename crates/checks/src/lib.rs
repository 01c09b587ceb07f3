//! # hydrocheck Checks
//!
//! Flow and elevation consistency checks for hydrographic vector
//! networks:
//!
//! - **flow**: drainage lines must run monotonically uphill or downhill
//! - **continuity**: endpoints must connect to exactly one continuing
//!   feature or drain into an adjacent layer
//! - **basin**: candidate termini must carry the true maximum height;
//!   candidate endorheic basins must be genuinely closed
//! - **surface**: flat water bodies must sit at one elevation and agree
//!   with crossing drainage

pub mod basin;
pub mod continuity;
pub mod flow;
pub mod runner;
pub mod surface;

pub use basin::{classify, intersects_any_layer, verify_endorheic, verify_maxima, CandidateMaximum, CandidateSet};
pub use continuity::{resolve_endpoints, EndpointOutcome, EndpointResolution, EndpointTag};
pub use flow::scan_flow;
pub use runner::{RunSummary, Runner};
pub use surface::validate_surface;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::basin::{classify, verify_endorheic, verify_maxima, CandidateSet};
    pub use crate::continuity::resolve_endpoints;
    pub use crate::flow::scan_flow;
    pub use crate::runner::{RunSummary, Runner};
    pub use crate::surface::validate_surface;
    pub use hydrocheck_core::prelude::*;
}
