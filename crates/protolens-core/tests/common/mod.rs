#![allow(dead_code)]

use protolens_core::decode::ByteRegion;
use protolens_core::decode::path::is_ancestor;
use protolens_core::schema::{EnumDef, FieldDef, MessageDef, Schema, SchemaSource};

pub const VARINT: u8 = 0;
pub const FIXED64: u8 = 1;
pub const LEN: u8 = 2;
pub const START_GROUP: u8 = 3;
pub const FIXED32: u8 = 5;

/// Minimal wire-format writer for building test buffers.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn varint(mut self, mut value: u64) -> Self {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
        self
    }

    pub fn tag(self, field: u32, wire_type: u8) -> Self {
        self.varint((u64::from(field) << 3) | u64::from(wire_type))
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn varint_field(self, field: u32, value: u64) -> Self {
        self.tag(field, VARINT).varint(value)
    }

    pub fn bytes_field(self, field: u32, bytes: &[u8]) -> Self {
        self.tag(field, LEN).varint(bytes.len() as u64).raw(bytes)
    }

    pub fn fixed32_field(self, field: u32, bytes: [u8; 4]) -> Self {
        self.tag(field, FIXED32).raw(&bytes)
    }

    pub fn fixed64_field(self, field: u32, bytes: [u8; 8]) -> Self {
        self.tag(field, FIXED64).raw(&bytes)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Person/Address schema shared by the decoder tests.
pub fn person_schema() -> Schema {
    SchemaSource::new()
        .with_root("demo.Person")
        .message(
            MessageDef::new("demo.Person")
                .field(FieldDef::new(1, "name", "string"))
                .field(FieldDef::new(2, "id", "int32"))
                .field(FieldDef::new(3, "scores", "int32").packed())
                .field(FieldDef::new(4, "addresses", "Address").repeated())
                .field(FieldDef::new(5, "kind", "Kind"))
                .field(FieldDef::new(6, "home", "Address"))
                .field(FieldDef::new(7, "tags", "string").repeated())
                .field(FieldDef::new(8, "labels", "map<string,string>").map())
                .field(FieldDef::new(9, "extra", "Any"))
                .field(FieldDef::new(10, "ids", "int32").repeated()),
        )
        .message(
            MessageDef::new("demo.Address")
                .field(FieldDef::new(1, "city", "string"))
                .field(FieldDef::new(2, "zip", "uint32"))
                .field(FieldDef::new(3, "geo", "Geo")),
        )
        .message(
            MessageDef::new("demo.Address.Geo")
                .field(FieldDef::new(1, "lat", "double"))
                .field(FieldDef::new(2, "lon", "double")),
        )
        .enumeration(
            EnumDef::new("demo.Kind")
                .value("KIND_UNKNOWN", 0)
                .value("KIND_ADMIN", 1),
        )
        .bind()
        .expect("person schema binds")
}

/// Assert the structural invariants every successful decode must satisfy.
pub fn assert_region_invariants(regions: &[ByteRegion], buffer_len: usize) {
    for region in regions {
        assert!(
            region.start < region.end,
            "empty region {} {}..{}",
            region.path,
            region.start,
            region.end
        );
        assert!(region.end <= buffer_len, "region {} past buffer", region.path);
    }
    for outer in regions {
        for inner in regions {
            if is_ancestor(&outer.path, &inner.path) {
                assert!(
                    outer.start <= inner.start && inner.end <= outer.end,
                    "{} ({}..{}) does not contain {} ({}..{})",
                    outer.path,
                    outer.start,
                    outer.end,
                    inner.path,
                    inner.start,
                    inner.end
                );
            }
        }
    }
}
