use crate::imaging::ConversionReport;
use crate::metadata::{keyword, MetadataAnswer};
use crate::types::AttributeCoordinate;
use std::fmt;

/// Text report for a metadata answer
pub struct MetadataReport<'a> {
    answer: &'a MetadataAnswer,
}

impl<'a> MetadataReport<'a> {
    /// Creates a new text report
    pub fn new(answer: &'a MetadataAnswer) -> Self {
        Self { answer }
    }
}

impl<'a> fmt::Display for MetadataReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.answer {
            MetadataAnswer::Single { coordinate, value } => {
                writeln!(f, "{} {}: {}", coordinate, label(*coordinate), value)
            }
            MetadataAnswer::All(map) => {
                writeln!(f, "DICOM Metadata")?;
                writeln!(f, "==============")?;
                for (tag, value) in map {
                    let name = tag
                        .parse::<AttributeCoordinate>()
                        .map(label)
                        .unwrap_or("Unknown");
                    writeln!(f, "{} {:<32} {}", tag, name, value)?;
                }
                Ok(())
            }
        }
    }
}

fn label(coordinate: AttributeCoordinate) -> &'static str {
    keyword(coordinate).unwrap_or("Unknown")
}

/// Text summary of a conversion
pub struct ConversionSummary<'a> {
    report: &'a ConversionReport,
}

impl<'a> ConversionSummary<'a> {
    pub fn new(report: &'a ConversionReport) -> Self {
        Self { report }
    }
}

impl<'a> fmt::Display for ConversionSummary<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} of {} frame(s)",
            self.report.entries.len(),
            self.report.frame_count
        )?;
        for entry in &self.report.entries {
            writeln!(f, "  {}", entry)?;
        }
        if self.report.interrupted {
            writeln!(f, "Output closed before the archive was complete")?;
        }
        if !self.report.failures.is_empty() {
            writeln!(f, "Skipped:")?;
            for failure in &self.report.failures {
                writeln!(
                    f,
                    "  frame {} ({}): {}",
                    failure.index, failure.stage, failure.message
                )?;
            }
        }
        Ok(())
    }
}
