//! Mote Log Decoder Library
//!
//! A stateless, reusable library for decoding diagnostic telemetry captured
//! from embedded wireless mesh nodes ("motes") over their serial link.
//!
//! # Architecture
//!
//! The wire format is an HDLC-style flag/escape framing scheme carrying
//! typed, self-describing records. Decoding is a three-stage pipeline:
//! - The deframer recovers frame payloads from the raw byte stream
//! - The layout registry maps status discriminators to fixed binary layouts
//! - The record decoder turns each payload into structured field values
//!
//! The library does NOT:
//! - Own the byte transport (serial port, socket); callers feed bytes
//! - Write reports or text output
//! - Interpret decoded values (DAG ranks, ASNs are passed through)
//!
//! All higher-level functionality is in the application layer (mote-log-cli).
//!
//! # Example Usage
//!
//! ```
//! use mote_log_decoder::{Decoder, DecoderConfig};
//!
//! let decoder = Decoder::new();
//! let wire = vec![0x7E, 0x53, 0x01, 0x02, 0x00, 0x00, 0x7E];
//!
//! let mut records = decoder.decode_bytes(wire, DecoderConfig::new());
//! let record = records.next().unwrap().unwrap();
//! assert_eq!(record.label(), "status/IsSync");
//! assert_eq!(record.field("isSync").unwrap().as_i64(), 0);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod framing;
pub mod layouts;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{Decoder, RecordIterator};
pub use framing::{Deframer, FramingStats};
pub use layouts::{LayoutRegistry, RegistryStats};
pub use types::{
    DecodeFault, DecodedField, DecodedRecord, DecoderError, FaultCounters, FaultKind,
    FieldValue, MoteId, RecordClass, Result,
};

// Internal modules (not exposed in public API)
mod record;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder over the standard table
        let decoder = Decoder::new();
        let stats = decoder.registry_stats();
        assert_eq!(stats.num_layouts, 9);
        assert!(stats.num_fields > 0);
    }
}
