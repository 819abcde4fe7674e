//! Record decoding engine
//!
//! Turns one deframed payload into a [`DecodedRecord`] or a [`DecodeFault`].
//! Dispatch is explicit: the class tag selects the record family, and for
//! status records the discriminator selects a layout from the registry.
//! A fault never aborts the pipeline; the caller reports it and moves on.

use crate::layouts::{FieldKind, FieldSpec, LayoutRegistry, NOTIFICATION_FIELDS, NOTIFICATION_LAYOUT};
use crate::types::{DecodeFault, DecodedField, DecodedRecord, FieldValue, RecordClass};
use byteorder::{ByteOrder, LittleEndian};

/// Minimum viable payload: tag byte + 2-byte mote id + 1 type/content byte
const MIN_PAYLOAD_LEN: usize = 4;

/// Body length shared by all notification classes
const NOTIFICATION_BODY_LEN: usize = 6;

/// Decode one frame payload
pub fn decode_payload(
    payload: &[u8],
    registry: &LayoutRegistry,
) -> Result<DecodedRecord, DecodeFault> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(DecodeFault::TooShort {
            len: payload.len(),
            payload: payload.to_vec(),
        });
    }

    let tag = payload[0];
    let class = RecordClass::from_tag(tag).ok_or_else(|| DecodeFault::UnknownRecordClass {
        tag,
        payload: payload.to_vec(),
    })?;

    // Bytes 1-2: originating mote, opaque beyond correlation
    let mote = u16::from_le_bytes([payload[1], payload[2]]);

    match class {
        RecordClass::Status => {
            let discriminator = payload[3];
            let body = &payload[4..];

            let layout = registry.lookup(discriminator).ok_or_else(|| {
                DecodeFault::UnknownDiscriminator {
                    discriminator,
                    mote,
                    body: body.to_vec(),
                }
            })?;

            if body.len() < layout.byte_len {
                return Err(DecodeFault::TruncatedPayload {
                    layout: layout.name,
                    expected: layout.byte_len,
                    actual: body.len(),
                    mote,
                });
            }
            if body.len() > layout.byte_len {
                log::debug!(
                    "status/{} from mote 0x{:04X}: {} trailing bytes ignored",
                    layout.name,
                    mote,
                    body.len() - layout.byte_len
                );
            }

            Ok(DecodedRecord {
                class,
                layout: layout.name,
                mote,
                fields: decode_fields(&body[..layout.byte_len], layout.fields),
            })
        }
        RecordClass::Info | RecordClass::Error | RecordClass::Critical => {
            let body = &payload[3..];
            if body.len() < NOTIFICATION_BODY_LEN {
                return Err(DecodeFault::TruncatedPayload {
                    layout: NOTIFICATION_LAYOUT,
                    expected: NOTIFICATION_BODY_LEN,
                    actual: body.len(),
                    mote,
                });
            }

            Ok(DecodedRecord {
                class,
                layout: NOTIFICATION_LAYOUT,
                mote,
                fields: decode_fields(&body[..NOTIFICATION_BODY_LEN], NOTIFICATION_FIELDS),
            })
        }
    }
}

/// Decode a body of exactly the specs' total width into field values.
///
/// Length is validated by the caller, so slice indexing cannot go out of
/// bounds here.
fn decode_fields(body: &[u8], specs: &'static [FieldSpec]) -> Vec<DecodedField> {
    let mut fields = Vec::with_capacity(specs.len());
    let mut offset = 0;
    for spec in specs {
        let value = match spec.kind {
            FieldKind::U8 => FieldValue::Unsigned(body[offset] as u64),
            FieldKind::U16 => {
                FieldValue::Unsigned(LittleEndian::read_u16(&body[offset..]) as u64)
            }
            FieldKind::I16 => {
                FieldValue::Signed(LittleEndian::read_i16(&body[offset..]) as i64)
            }
            FieldKind::U32 => {
                FieldValue::Unsigned(LittleEndian::read_u32(&body[offset..]) as u64)
            }
        };
        fields.push(DecodedField {
            name: spec.name,
            value,
        });
        offset += spec.kind.width();
    }
    fields
}
