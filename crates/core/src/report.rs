//! Findings and report sinks
//!
//! Findings are the expected output of the checks, not failures. They
//! are write-once, emitted in discovery order and never revised. The
//! CSV sink reproduces the column layout of the survey report format:
//! layer, feature id, description, height, height difference, X, Y.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The reportable defect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    PreviousVertexInflection,
    RelativeInflection,
    ContinuityError,
    IntersectionHeightMismatch,
    MissingMaximum,
    EndorheicWithoutClosure,
    PolygonHeightMismatch,
    UnsupportedIntersectionGeometry,
}

impl Category {
    /// Report description, as printed in the CSV Description column.
    pub fn label(&self) -> &'static str {
        match self {
            Category::PreviousVertexInflection => "Error - Previous vertex inflexion",
            Category::RelativeInflection => "Error - Relative inflexion",
            Category::ContinuityError => "Error - Continuity",
            Category::IntersectionHeightMismatch => "Error - Difference in height intersection",
            Category::MissingMaximum => "Error - Node with no maximum height",
            Category::EndorheicWithoutClosure => "Error - Endorheic",
            Category::PolygonHeightMismatch => "Error - Polygon height",
            Category::UnsupportedIntersectionGeometry => "Error - Unsupported intersection geometry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reportable row. Numeric diagnostics are optional: continuity and
/// closure findings carry no elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub layer: String,
    pub feature: String,
    pub category: Category,
    pub elevation: Option<f64>,
    pub delta: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Free-form qualifier: an unexpected geometry type tag, or the
    /// layer/feature on the other side of an intersection mismatch.
    pub detail: Option<String>,
}

impl Finding {
    pub fn new(layer: &str, feature: &str, category: Category) -> Self {
        Self {
            layer: layer.to_string(),
            feature: feature.to_string(),
            category,
            elevation: None,
            delta: None,
            x: None,
            y: None,
            detail: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Ordered consumer of findings.
pub trait ReportSink {
    fn write(&mut self, finding: &Finding) -> Result<()>;
}

/// Collects findings in memory; used by tests and the idempotence
/// checks.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub findings: Vec<Finding>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for MemorySink {
    fn write(&mut self, finding: &Finding) -> Result<()> {
        self.findings.push(finding.clone());
        Ok(())
    }
}

const HEADER: [&str; 7] = [
    "Input_Layer",
    "OBJECTID",
    "Description",
    "Height",
    "Height_difference",
    "X_Coordinate",
    "Y_Coordinate",
];

/// CSV report writer. Writes the header row on construction.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Other(e.to_string()))
    }
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write(&mut self, finding: &Finding) -> Result<()> {
        let description = match &finding.detail {
            Some(detail) => format!("{} ({})", finding.category.label(), detail),
            None => finding.category.label().to_string(),
        };
        self.writer.write_record([
            finding.layer.as_str(),
            finding.feature.as_str(),
            description.as_str(),
            number(finding.elevation).as_str(),
            number(finding.delta).as_str(),
            number(finding.x).as_str(),
            number(finding.y).as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write(
            &Finding::new("drainage", "D1", Category::PreviousVertexInflection)
                .with_elevation(12.5)
                .with_delta(0.4)
                .with_location(100.0, 200.0),
        )
        .unwrap();
        sink.write(&Finding::new("drainage", "D2", Category::ContinuityError))
            .unwrap();

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Input_Layer,OBJECTID,Description"));
        assert_eq!(
            lines[1],
            "drainage,D1,Error - Previous vertex inflexion,12.5,0.4,100,200"
        );
        assert_eq!(lines[2], "drainage,D2,Error - Continuity,,,,");
    }

    #[test]
    fn test_detail_is_appended_to_description() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write(
            &Finding::new("lakes", "L1", Category::UnsupportedIntersectionGeometry)
                .with_detail("polygon"),
        )
        .unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert!(text.contains("Error - Unsupported intersection geometry (polygon)"));
    }

    #[test]
    fn test_memory_sink_preserves_order() {
        let mut sink = MemorySink::new();
        let a = Finding::new("l", "1", Category::MissingMaximum);
        let b = Finding::new("l", "2", Category::EndorheicWithoutClosure);
        sink.write(&a).unwrap();
        sink.write(&b).unwrap();
        assert_eq!(sink.findings, vec![a, b]);
    }
}
