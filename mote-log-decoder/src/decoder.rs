//! Main decoder API
//!
//! The `Decoder` struct is the entry point: it owns a handle to the layout
//! registry and turns byte sources (capture files, in-memory buffers) into
//! record iterators. Each iterator is one independent pipeline with its own
//! deframer and fault counters; the registry is read-only and shared, so
//! pipelines for different sources can run on separate threads without
//! coordination.

use crate::config::DecoderConfig;
use crate::framing::Deframer;
use crate::layouts::{LayoutRegistry, RegistryStats};
use crate::record::decode_payload;
use crate::types::{DecodeFault, DecodedRecord, DecoderError, FaultCounters, Result};
use std::fs;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    registry: LayoutRegistry,
}

impl Decoder {
    /// Create a decoder over the standard layout registry
    pub fn new() -> Self {
        Self {
            registry: LayoutRegistry::standard(),
        }
    }

    /// Decode a capture file, reading it fully into memory first
    ///
    /// Returns an iterator that yields decoded records, and faults when
    /// `config.report_faults` is set. A fault item never terminates the
    /// iterator; only source exhaustion does.
    ///
    /// # Example
    /// ```no_run
    /// use mote_log_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new();
    /// let records = decoder
    ///     .decode_file(Path::new("capture.bin"), DecoderConfig::new())
    ///     .unwrap();
    /// for item in records {
    ///     match item {
    ///         Ok(record) => println!("{}", record.label()),
    ///         Err(fault) => eprintln!("frame fault: {}", fault),
    ///     }
    /// }
    /// ```
    pub fn decode_file(
        &self,
        path: &Path,
        config: DecoderConfig,
    ) -> Result<RecordIterator<std::vec::IntoIter<u8>>> {
        log::info!("Decoding capture file: {:?}", path);

        let bytes = fs::read(path).map_err(|e| {
            DecoderError::CaptureReadError(format!("Failed to read {:?}: {}", path, e))
        })?;

        log::debug!("Read {} bytes from {:?}", bytes.len(), path);
        Ok(self.decode_bytes(bytes, config))
    }

    /// Decode an arbitrary byte source
    pub fn decode_bytes<I>(&self, bytes: I, config: DecoderConfig) -> RecordIterator<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        RecordIterator {
            bytes: bytes.into_iter(),
            deframer: Deframer::new(),
            registry: self.registry,
            config,
            decode_counters: FaultCounters::default(),
            emitted_records: 0,
            exhausted: false,
        }
    }

    /// Statistics about the layout registry
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// One decode pipeline: byte source -> deframer -> record decoder
///
/// Strictly sequential within itself (byte order determines frame order,
/// frame order determines record order). Counters stay available after the
/// iterator is exhausted.
pub struct RecordIterator<I>
where
    I: Iterator<Item = u8>,
{
    bytes: I,
    deframer: Deframer,
    registry: LayoutRegistry,
    config: DecoderConfig,
    decode_counters: FaultCounters,
    emitted_records: usize,
    exhausted: bool,
}

impl<I> RecordIterator<I>
where
    I: Iterator<Item = u8>,
{
    /// Fault counters accumulated so far, including framing edge cases
    pub fn counters(&self) -> FaultCounters {
        let framing = self.deframer.stats();
        let mut counters = self.decode_counters;
        counters.unterminated_frames = framing.unterminated_frames;
        counters.stray_escapes = framing.stray_escapes;
        counters
    }

    /// Complete frames seen so far (including ones that faulted or were
    /// filtered out)
    pub fn frames_seen(&self) -> u64 {
        self.deframer.stats().frames
    }

    /// Records emitted so far
    pub fn records_emitted(&self) -> usize {
        self.emitted_records
    }

    /// Decode one complete frame payload, applying filters and counting
    /// faults. `None` means the item was swallowed (filtered or unreported
    /// fault) and the pipeline should continue.
    fn process_payload(&mut self, payload: Vec<u8>) -> Option<<Self as Iterator>::Item> {
        match decode_payload(&payload, &self.registry) {
            Ok(record) => {
                if !self.config.should_emit(record.mote, record.class) {
                    log::trace!("record {} filtered out", record.label());
                    return None;
                }
                self.emitted_records += 1;
                Some(Ok(record))
            }
            Err(fault) => {
                log::warn!("frame fault: {}", fault);
                self.decode_counters.record(fault.kind());
                if self.config.report_faults {
                    Some(Err(fault))
                } else {
                    None
                }
            }
        }
    }
}

impl<I> Iterator for RecordIterator<I>
where
    I: Iterator<Item = u8>,
{
    type Item = std::result::Result<DecodedRecord, DecodeFault>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if let Some(max) = self.config.max_records {
            if self.emitted_records >= max {
                log::debug!("record cap of {} reached, stopping pipeline", max);
                self.exhausted = true;
                return None;
            }
        }

        loop {
            match self.bytes.next() {
                Some(byte) => {
                    if let Some(payload) = self.deframer.push(byte) {
                        if let Some(item) = self.process_payload(payload) {
                            return Some(item);
                        }
                        // Swallowed item, keep pulling bytes
                    }
                }
                None => {
                    // Source exhausted: fold any unterminated tail into the
                    // framing stats, then end the stream
                    self.deframer.finish();
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}
