//! Status layout registry
//!
//! The firmware's `debugPrint_*` emitters serialize fixed C structs over
//! the serial link; this table is the receiving side of that contract.
//! Field names, widths and order must match the wire layout exactly, so
//! the table is hand-authored, constructed once, and never mutated.
//!
//! All multi-byte fields are little-endian. Mote addresses are the 2-byte
//! short form used throughout the network.

/// Primitive wire type of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    /// Signed 16-bit, used for RSSI and timing-correction values
    I16,
}

impl FieldKind {
    /// Width of this field on the wire, in bytes
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 => 4,
        }
    }
}

/// One field of a layout: name plus primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// A complete binary layout for one status discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDescriptor {
    /// Discriminator value selecting this layout (payload byte 3)
    pub discriminator: u8,
    /// Layout name, reported as "status/<name>"
    pub name: &'static str,
    /// Expected body length in bytes; always the sum of field widths
    pub byte_len: usize,
    /// Fields in wire order
    pub fields: &'static [FieldSpec],
}

macro_rules! fields {
    ($(($name:expr, $kind:ident)),* $(,)?) => {
        &[$(FieldSpec { name: $name, kind: FieldKind::$kind }),*]
    };
}

/// The nine status layouts, indexed by discriminator 0-8
static STATUS_LAYOUTS: &[LayoutDescriptor] = &[
    LayoutDescriptor {
        discriminator: 0,
        name: "IsSync",
        byte_len: 1,
        fields: fields![("isSync", U8)],
    },
    LayoutDescriptor {
        discriminator: 1,
        name: "IdManager",
        byte_len: 4,
        fields: fields![
            ("isDAGroot", U8),
            ("isBridge", U8),
            ("my16bID", U16),
        ],
    },
    LayoutDescriptor {
        discriminator: 2,
        name: "MyDagRank",
        byte_len: 2,
        fields: fields![("myDagRank", U16)],
    },
    LayoutDescriptor {
        discriminator: 3,
        name: "OutputBuffer",
        byte_len: 4,
        fields: fields![("index_write", U16), ("index_read", U16)],
    },
    LayoutDescriptor {
        // 5-byte absolute slot number, split the way the firmware stores it
        discriminator: 4,
        name: "Asn",
        byte_len: 5,
        fields: fields![("asn_4", U8), ("asn_2_3", U16), ("asn_0_1", U16)],
    },
    LayoutDescriptor {
        discriminator: 5,
        name: "MacStats",
        byte_len: 7,
        fields: fields![
            ("numSyncPkt", U8),
            ("numSyncAck", U8),
            ("minCorrection", I16),
            ("maxCorrection", I16),
            ("numDeSync", U8),
        ],
    },
    LayoutDescriptor {
        discriminator: 6,
        name: "ScheduleRow",
        byte_len: 16,
        fields: fields![
            ("row", U8),
            ("slotOffset", U16),
            ("type", U8),
            ("shared", U8),
            ("channelOffset", U8),
            ("neighbor", U16),
            ("numRx", U8),
            ("numTx", U8),
            ("numTxACK", U8),
            ("lastUsedAsn_4", U8),
            ("lastUsedAsn_2_3", U16),
            ("lastUsedAsn_0_1", U16),
        ],
    },
    LayoutDescriptor {
        // One (creator, owner) byte pair per queue slot, ten slots
        discriminator: 7,
        name: "QueueRow",
        byte_len: 20,
        fields: fields![
            ("creator_0", U8), ("owner_0", U8),
            ("creator_1", U8), ("owner_1", U8),
            ("creator_2", U8), ("owner_2", U8),
            ("creator_3", U8), ("owner_3", U8),
            ("creator_4", U8), ("owner_4", U8),
            ("creator_5", U8), ("owner_5", U8),
            ("creator_6", U8), ("owner_6", U8),
            ("creator_7", U8), ("owner_7", U8),
            ("creator_8", U8), ("owner_8", U8),
            ("creator_9", U8), ("owner_9", U8),
        ],
    },
    LayoutDescriptor {
        discriminator: 8,
        name: "NeighborsRow",
        byte_len: 21,
        fields: fields![
            ("row", U8),
            ("used", U8),
            ("parentPreference", U8),
            ("stableNeighbor", U8),
            ("switchStabilityCounter", U8),
            ("addr_16b", U16),
            ("DAGrank", U16),
            ("rssi", I16),
            ("numRx", U8),
            ("numTx", U8),
            ("numTxACK", U8),
            ("numWraps", U8),
            ("asn_4", U8),
            ("asn_2_3", U16),
            ("asn_0_1", U16),
            ("joinPrio", U8),
        ],
    },
];

/// Fixed body shared by the info/error/critical notification classes:
/// 6 bytes after the mote identifier
pub static NOTIFICATION_FIELDS: &[FieldSpec] = fields![
    ("calling_component", U8),
    ("error_code", U8),
    ("argument_1", U16),
    ("argument_2", U16),
];

/// Layout name used for all notification-class records
pub const NOTIFICATION_LAYOUT: &str = "Notification";

/// Read-only view over the status layout table
///
/// Cheap to copy and safe to share across pipelines; the underlying table
/// lives in static memory.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRegistry {
    layouts: &'static [LayoutDescriptor],
}

impl LayoutRegistry {
    /// The standard registry matching the deployed firmware
    pub fn standard() -> Self {
        Self {
            layouts: STATUS_LAYOUTS,
        }
    }

    /// Find the layout for a status discriminator
    pub fn lookup(&self, discriminator: u8) -> Option<&'static LayoutDescriptor> {
        self.layouts
            .iter()
            .find(|layout| layout.discriminator == discriminator)
    }

    /// All layouts, in discriminator order
    pub fn layouts(&self) -> &'static [LayoutDescriptor] {
        self.layouts
    }

    /// Registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_layouts: self.layouts.len(),
            num_fields: self.layouts.iter().map(|l| l.fields.len()).sum(),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of status layouts
    pub num_layouts: usize,
    /// Total field definitions across all layouts
    pub num_fields: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_nine_layouts() {
        let registry = LayoutRegistry::standard();
        assert_eq!(registry.stats().num_layouts, 9);
        for disc in 0..=8u8 {
            let layout = registry.lookup(disc).expect("layout missing");
            assert_eq!(layout.discriminator, disc);
        }
        assert!(registry.lookup(9).is_none());
        assert!(registry.lookup(0xFF).is_none());
    }

    #[test]
    fn test_field_widths_sum_to_declared_length() {
        for layout in LayoutRegistry::standard().layouts() {
            let sum: usize = layout.fields.iter().map(|f| f.kind.width()).sum();
            assert_eq!(
                sum, layout.byte_len,
                "width mismatch in layout {}",
                layout.name
            );
        }
    }

    #[test]
    fn test_notification_body_is_six_bytes() {
        let sum: usize = NOTIFICATION_FIELDS.iter().map(|f| f.kind.width()).sum();
        assert_eq!(sum, 6);
        assert_eq!(NOTIFICATION_FIELDS.len(), 4);
    }

    #[test]
    fn test_expected_layout_names() {
        let registry = LayoutRegistry::standard();
        let names: Vec<&str> = (0..=8u8)
            .map(|d| registry.lookup(d).unwrap().name)
            .collect();
        assert_eq!(
            names,
            vec![
                "IsSync",
                "IdManager",
                "MyDagRank",
                "OutputBuffer",
                "Asn",
                "MacStats",
                "ScheduleRow",
                "QueueRow",
                "NeighborsRow",
            ]
        );
    }
}
