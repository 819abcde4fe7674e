//! Core types for the mote log decoder library
//!
//! This module defines all the fundamental types that the decoder emits when
//! processing serial capture streams. The decoder is stateless and only
//! outputs decoded records and per-frame faults - it does not interpret
//! field values or track mote state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// 2-byte identifier of the originating mesh node.
///
/// Decoded from every payload but treated as opaque correlation data.
pub type MoteId = u16;

/// Errors that can occur while setting up or driving a decode pipeline
///
/// These are pipeline-fatal errors (bad input file, unreadable source).
/// Per-frame decode problems are [`DecodeFault`]s instead and never abort
/// the stream.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to read capture: {0}")]
    CaptureReadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Record class, identified by the ASCII tag in payload byte 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordClass {
    /// Periodic status snapshot (tag `'S'`), sub-typed by a discriminator
    Status,
    /// Informational notification (tag `'I'`)
    Info,
    /// Error notification (tag `'E'`)
    Error,
    /// Critical notification (tag `'C'`)
    Critical,
}

impl RecordClass {
    /// Map a payload tag byte to a record class
    pub fn from_tag(tag: u8) -> Option<RecordClass> {
        match tag {
            b'S' => Some(RecordClass::Status),
            b'I' => Some(RecordClass::Info),
            b'E' => Some(RecordClass::Error),
            b'C' => Some(RecordClass::Critical),
            _ => None,
        }
    }

    /// The ASCII tag byte this class uses on the wire
    pub fn tag(&self) -> u8 {
        match self {
            RecordClass::Status => b'S',
            RecordClass::Info => b'I',
            RecordClass::Error => b'E',
            RecordClass::Critical => b'C',
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Status => write!(f, "status"),
            RecordClass::Info => write!(f, "info"),
            RecordClass::Error => write!(f, "error"),
            RecordClass::Critical => write!(f, "critical"),
        }
    }
}

/// A decoded scalar field value
///
/// Widths are fixed per field by the layout table, so there is no
/// sign-extension ambiguity: signed fields arrive here already extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Unsigned integer field (8, 16 or 32 bits on the wire)
    Unsigned(u64),
    /// Signed integer field (16-bit on the wire: RSSI, timing corrections)
    Signed(i64),
}

impl FieldValue {
    /// Convert to i64 regardless of signedness (lossless for all wire widths)
    pub fn as_i64(&self) -> i64 {
        match self {
            FieldValue::Unsigned(v) => *v as i64,
            FieldValue::Signed(v) => *v,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
        }
    }
}

/// A single decoded field: wire-order position is preserved by the
/// containing record's field vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedField {
    /// Field name from the layout table
    pub name: &'static str,
    /// Decoded value
    pub value: FieldValue,
}

/// Main decoded record type - the primary output of the decoder
///
/// Transient: produced for one frame, handed to the caller, then released.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRecord {
    /// Record class from the payload tag byte
    pub class: RecordClass,
    /// Layout name: the status layout (e.g. "IsSync") or "Notification"
    pub layout: &'static str,
    /// Originating mote (opaque, little-endian byte pair from the wire)
    pub mote: MoteId,
    /// Decoded fields in wire order
    pub fields: Vec<DecodedField>,
}

impl DecodedRecord {
    /// Full record label, e.g. "status/IsSync" or "error/Notification"
    pub fn label(&self) -> String {
        format!("{}/{}", self.class, self.layout)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value)
    }
}

/// Per-frame decode faults
///
/// Every fault is recoverable at the frame boundary: the pipeline reports
/// it and moves on to the next frame. Raw bytes are carried for offline
/// re-analysis.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind")]
pub enum DecodeFault {
    #[error("payload too short: {len} bytes (minimum 4)")]
    TooShort {
        /// Actual payload length
        len: usize,
        /// The raw payload
        payload: Vec<u8>,
    },

    #[error("unknown record class tag 0x{tag:02X}")]
    UnknownRecordClass {
        /// The unrecognized tag byte
        tag: u8,
        /// The raw payload
        payload: Vec<u8>,
    },

    #[error("unknown status discriminator {discriminator} from mote 0x{mote:04X}")]
    UnknownDiscriminator {
        /// The unrecognized discriminator value
        discriminator: u8,
        /// Originating mote
        mote: MoteId,
        /// Raw bytes following the discriminator
        body: Vec<u8>,
    },

    #[error("truncated payload for layout {layout}: need {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Name of the matched layout
        layout: &'static str,
        /// Bytes the layout requires
        expected: usize,
        /// Bytes actually present
        actual: usize,
        /// Originating mote
        mote: MoteId,
    },
}

impl DecodeFault {
    /// The fault kind, for counting
    pub fn kind(&self) -> FaultKind {
        match self {
            DecodeFault::TooShort { .. } => FaultKind::TooShort,
            DecodeFault::UnknownRecordClass { .. } => FaultKind::UnknownRecordClass,
            DecodeFault::UnknownDiscriminator { .. } => FaultKind::UnknownDiscriminator,
            DecodeFault::TruncatedPayload { .. } => FaultKind::TruncatedPayload,
        }
    }
}

/// Fault kinds, used as counter buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    TooShort,
    UnknownRecordClass,
    UnknownDiscriminator,
    TruncatedPayload,
}

/// Per-pipeline fault counters for operational visibility
///
/// Includes the framing-level edge cases (unterminated trailing frame,
/// stray escape bytes) that never surface as [`DecodeFault`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultCounters {
    pub too_short: u64,
    pub unknown_record_class: u64,
    pub unknown_discriminator: u64,
    pub truncated_payload: u64,
    /// Frames still open when the byte source ended (dropped, not emitted)
    pub unterminated_frames: u64,
    /// Escape bytes followed by a non-marker byte (copied literally)
    pub stray_escapes: u64,
}

impl FaultCounters {
    /// Bump the counter for one decode fault kind
    pub fn record(&mut self, kind: FaultKind) {
        match kind {
            FaultKind::TooShort => self.too_short += 1,
            FaultKind::UnknownRecordClass => self.unknown_record_class += 1,
            FaultKind::UnknownDiscriminator => self.unknown_discriminator += 1,
            FaultKind::TruncatedPayload => self.truncated_payload += 1,
        }
    }

    /// Total decode faults (framing edge cases not included)
    pub fn total_decode_faults(&self) -> u64 {
        self.too_short
            + self.unknown_record_class
            + self.unknown_discriminator
            + self.truncated_payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_class_tags() {
        assert_eq!(RecordClass::from_tag(b'S'), Some(RecordClass::Status));
        assert_eq!(RecordClass::from_tag(b'I'), Some(RecordClass::Info));
        assert_eq!(RecordClass::from_tag(b'E'), Some(RecordClass::Error));
        assert_eq!(RecordClass::from_tag(b'C'), Some(RecordClass::Critical));
        assert_eq!(RecordClass::from_tag(b'X'), None);

        assert_eq!(RecordClass::Status.tag(), b'S');
        assert_eq!(format!("{}", RecordClass::Critical), "critical");
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(format!("{}", FieldValue::Unsigned(42)), "42");
        assert_eq!(format!("{}", FieldValue::Signed(-17)), "-17");
        assert_eq!(FieldValue::Signed(-17).as_i64(), -17);
        assert_eq!(FieldValue::Unsigned(42).as_i64(), 42);
    }

    #[test]
    fn test_record_label_and_field_lookup() {
        let record = DecodedRecord {
            class: RecordClass::Status,
            layout: "IsSync",
            mote: 0x0201,
            fields: vec![DecodedField {
                name: "isSync",
                value: FieldValue::Unsigned(1),
            }],
        };
        assert_eq!(record.label(), "status/IsSync");
        assert_eq!(record.field("isSync"), Some(FieldValue::Unsigned(1)));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_fault_counters() {
        let mut counters = FaultCounters::default();
        counters.record(FaultKind::TooShort);
        counters.record(FaultKind::TooShort);
        counters.record(FaultKind::TruncatedPayload);
        assert_eq!(counters.too_short, 2);
        assert_eq!(counters.truncated_payload, 1);
        assert_eq!(counters.total_decode_faults(), 3);
    }
}
