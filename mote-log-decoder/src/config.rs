//! Decoder configuration types
//!
//! The minimal configuration needed by the decoder library. Anything
//! presentation-related (output files, report formats) belongs to the
//! application layer.

use crate::types::{MoteId, RecordClass};
use serde::{Deserialize, Serialize};

/// Configuration for one decode pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Whether per-frame faults are yielded to the caller. When false,
    /// faults are still counted but the stream carries records only.
    #[serde(default = "default_true")]
    pub report_faults: bool,

    /// Optional: only emit records from these motes
    #[serde(default)]
    pub mote_filter: Option<Vec<MoteId>>,

    /// Optional: only emit records of these classes
    #[serde(default)]
    pub class_filter: Option<Vec<RecordClass>>,

    /// Optional cap on emitted records (faults do not count towards it)
    #[serde(default)]
    pub max_records: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            report_faults: true,
            mote_filter: None,
            class_filter: None,
            max_records: None,
        }
    }
}

impl DecoderConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable fault reporting
    pub fn with_fault_reporting(mut self, enabled: bool) -> Self {
        self.report_faults = enabled;
        self
    }

    /// Builder method: set the mote filter
    pub fn with_mote_filter(mut self, motes: Vec<MoteId>) -> Self {
        self.mote_filter = Some(motes);
        self
    }

    /// Builder method: set the record class filter
    pub fn with_class_filter(mut self, classes: Vec<RecordClass>) -> Self {
        self.class_filter = Some(classes);
        self
    }

    /// Builder method: cap the number of emitted records
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Check if a record from this mote should be emitted
    pub fn should_emit_mote(&self, mote: MoteId) -> bool {
        match &self.mote_filter {
            Some(motes) => motes.contains(&mote),
            None => true,
        }
    }

    /// Check if a record of this class should be emitted
    pub fn should_emit_class(&self, class: RecordClass) -> bool {
        match &self.class_filter {
            Some(classes) => classes.contains(&class),
            None => true,
        }
    }

    /// Combined record filter
    pub fn should_emit(&self, mote: MoteId, class: RecordClass) -> bool {
        self.should_emit_mote(mote) && self.should_emit_class(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DecoderConfig::new()
            .with_fault_reporting(false)
            .with_mote_filter(vec![0x0201, 0x0202])
            .with_class_filter(vec![RecordClass::Status])
            .with_max_records(100);

        assert!(!config.report_faults);
        assert_eq!(config.mote_filter, Some(vec![0x0201, 0x0202]));
        assert_eq!(config.max_records, Some(100));
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new()
            .with_mote_filter(vec![0x0201])
            .with_class_filter(vec![RecordClass::Status, RecordClass::Error]);

        assert!(config.should_emit(0x0201, RecordClass::Status));
        assert!(config.should_emit(0x0201, RecordClass::Error));
        assert!(!config.should_emit(0x0202, RecordClass::Status)); // Wrong mote
        assert!(!config.should_emit(0x0201, RecordClass::Info)); // Wrong class
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();

        // Without filters, everything should pass
        assert!(config.should_emit(0x0000, RecordClass::Info));
        assert!(config.should_emit(0xFFFF, RecordClass::Critical));
    }
}
