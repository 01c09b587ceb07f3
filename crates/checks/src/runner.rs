//! Per-layer orchestration of the checks
//!
//! Runs single-threaded, one layer at a time, one feature at a time.
//! Within a flow layer the findings come out in a fixed order: endpoint
//! continuity and intersection-height findings per feature, then the
//! confirmed missing-maximum findings, then the confirmed endorheic
//! findings, then the flow-direction scan per feature. Surface layers
//! follow after all flow layers.
//!
//! A failure inside one layer (unknown layer, missing index, missing
//! adjacency) is logged and does not abort the remaining layers.

use tracing::{error, info, warn};

use hydrocheck_core::geometry::GeometryZ;
use hydrocheck_core::{ControlConfig, Dataset, IndexSet, ReportSink, Result};

use crate::basin::{classify, verify_endorheic, verify_maxima};
use crate::continuity::resolve_endpoints;
use crate::flow::scan_flow;
use crate::surface::validate_surface;

/// Outcome of a full pass.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub findings: usize,
    pub failed_layers: Vec<String>,
}

/// One validation run over a dataset. The spatial indexes are built up
/// front and read-only afterwards.
pub struct Runner<'a> {
    dataset: &'a Dataset,
    config: &'a ControlConfig,
    boundary: &'a GeometryZ,
    indexes: IndexSet,
}

impl<'a> Runner<'a> {
    pub fn new(
        dataset: &'a Dataset,
        config: &'a ControlConfig,
        boundary: &'a GeometryZ,
    ) -> Result<Self> {
        // A malformed entry fails its own layer mid-run, not the whole
        // run; flag it early anyway.
        if let Err(e) = config.validate() {
            warn!("{e}");
        }
        let indexes = IndexSet::build(dataset, &config.indexed_layers)?;
        Ok(Self {
            dataset,
            config,
            boundary,
            indexes,
        })
    }

    /// Run every configured check, writing findings to `sink` as they
    /// are discovered. Per-layer failures are recorded in the summary;
    /// sink failures abort the run.
    pub fn run(&self, sink: &mut dyn ReportSink) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for name in &self.config.flow_layers {
            info!(layer = %name, "verifying flow layer");
            match self.run_flow_layer(name, sink) {
                Ok(count) => summary.findings += count,
                Err(e) => {
                    error!(layer = %name, "flow layer failed: {e}");
                    summary.failed_layers.push(name.clone());
                }
            }
        }
        for name in &self.config.surface_layers {
            info!(layer = %name, "verifying surface layer");
            match self.run_surface_layer(name, sink) {
                Ok(count) => summary.findings += count,
                Err(e) => {
                    error!(layer = %name, "surface layer failed: {e}");
                    summary.failed_layers.push(name.clone());
                }
            }
        }
        Ok(summary)
    }

    /// Continuity, basin closure and flow direction for one line layer.
    pub fn run_flow_layer(&self, name: &str, sink: &mut dyn ReportSink) -> Result<usize> {
        let layer = self.dataset.layer(name)?;
        let mut written = 0;

        // Phase 1: endpoint resolution per feature. The candidate sets
        // are only built after every feature of the layer is resolved.
        let mut resolutions = Vec::with_capacity(layer.len());
        for feature in layer.iter() {
            let resolution =
                resolve_endpoints(layer, feature, self.dataset, &self.indexes, self.config)?;
            for finding in &resolution.findings {
                sink.write(finding)?;
                written += 1;
            }
            resolutions.push((feature.id.clone(), resolution));
        }

        // Phase 2: aggregate and verify the candidates.
        let candidates = classify(&resolutions);
        for finding in verify_maxima(
            layer,
            &candidates.maxima,
            &self.config.closure_layers,
            self.dataset,
            &self.indexes,
        )? {
            sink.write(&finding)?;
            written += 1;
        }
        for finding in verify_endorheic(
            layer,
            &candidates.endorheic,
            self.boundary,
            &self.config.closure_layers,
            self.dataset,
            &self.indexes,
        )? {
            sink.write(&finding)?;
            written += 1;
        }

        // Phase 3: flow direction per feature.
        for feature in layer.iter() {
            for finding in scan_flow(name, feature, self.config.line_tolerance) {
                sink.write(&finding)?;
                written += 1;
            }
        }

        Ok(written)
    }

    /// Constant-elevation check for one polygon layer.
    pub fn run_surface_layer(&self, name: &str, sink: &mut dyn ReportSink) -> Result<usize> {
        let layer = self.dataset.layer(name)?;
        let mut written = 0;
        for feature in layer.iter() {
            for finding in
                validate_surface(name, feature, self.dataset, &self.indexes, self.config)?
            {
                sink.write(&finding)?;
                written += 1;
            }
        }
        Ok(written)
    }
}
