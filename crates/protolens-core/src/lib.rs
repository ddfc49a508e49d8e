//! protolens core library: region-tracking decoding of protobuf wire data.
//!
//! Given a bound schema and a buffer encoded against one of its message
//! types, the decoder produces the decoded value tree and a flat index of
//! every field occurrence's byte span, path and depth. The index answers
//! "which field produced these bytes?" and "which bytes encode this field?".
//!
//! Layers, leaves first:
//! - `wire`: cursor-based primitive reads (layout/reader/error)
//! - `schema`: descriptor documents, binding, and the read-only schema view
//! - `decode`: the recursive region decoder and its value/region types
//! - `index`: pure queries over the region list
//!
//! Invariants:
//! - Region offsets are absolute in the input buffer at every depth.
//! - Every region spans at least one byte, and a nested message's region
//!   contains the regions of all its fields.
//! - Decoding is all-or-nothing; recovered conditions appear only as
//!   placeholder values.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use protolens_core::decode::DecodeOptions;
//! use protolens_core::inspect_file;
//! use protolens_core::schema::load_schema_file;
//!
//! let schema = load_schema_file(Path::new("schema.json"))?;
//! let report = inspect_file(&schema, Some("demo.Person"), Path::new("person.bin"), DecodeOptions::default())?;
//! println!("{} regions", report.regions.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod decode;
pub mod index;
pub mod schema;
pub mod wire;

pub use decode::{
    ByteRegion, DecodeFailure, DecodeOptions, DecodeOutput, DecodedValue, RegionDecoder, decode,
};
pub use index::{find_region_by_byte, find_regions_by_path, regions_containing};
pub use schema::{Schema, SchemaError, SchemaSource, load_schema_file};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the caller does not stamp the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decode result packaged for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Input buffer metadata.
    pub input: InputInfo,
    /// Fully-qualified root message type.
    pub root_type: String,
    /// Decoded value tree.
    pub value: DecodedValue,
    /// Byte regions in emission order.
    pub regions: Vec<ByteRegion>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use protolens_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "protolens".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "protolens");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided by the caller.
    pub path: String,
    /// Decoded buffer size in bytes.
    pub bytes: u64,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no root type given and the schema declares none")]
    MissingRootType,
    #[error(transparent)]
    Decode(#[from] DecodeFailure),
}

/// Package a decode result into a report with the default timestamp.
pub fn make_report(
    input_path: &str,
    input_bytes: u64,
    root_type: &str,
    output: DecodeOutput,
) -> InspectReport {
    InspectReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "protolens".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        root_type: root_type.to_string(),
        value: output.value,
        regions: output.regions,
    }
}

/// Decode an in-memory buffer and build its report.
///
/// # Examples
/// ```
/// use protolens_core::decode::DecodeOptions;
/// use protolens_core::inspect_bytes;
/// use protolens_core::schema::{FieldDef, MessageDef, SchemaSource};
///
/// let schema = SchemaSource::new()
///     .message(MessageDef::new("demo.Ping").field(FieldDef::new(1, "seq", "uint32")))
///     .bind()?;
/// let report = inspect_bytes(&schema, "demo.Ping", "ping.bin", &[0x08, 0x2a], DecodeOptions::default())?;
/// assert_eq!(report.input.bytes, 2);
/// assert_eq!(report.regions[0].path, "seq");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn inspect_bytes(
    schema: &Schema,
    root_type: &str,
    input_path: &str,
    buffer: &[u8],
    options: DecodeOptions,
) -> Result<InspectReport, DecodeFailure> {
    let output = RegionDecoder::with_options(schema, options).decode(root_type, buffer)?;
    Ok(make_report(
        input_path,
        buffer.len() as u64,
        root_type,
        output,
    ))
}

/// Read a binary input file and decode it as `root_type`, falling back to
/// the schema's declared root.
pub fn inspect_file(
    schema: &Schema,
    root_type: Option<&str>,
    path: &Path,
    options: DecodeOptions,
) -> Result<InspectReport, InspectError> {
    let root_type = root_type
        .or(schema.default_root())
        .ok_or(InspectError::MissingRootType)?;
    let buffer = fs::read(path)?;
    let report = inspect_bytes(
        schema,
        root_type,
        &path.display().to_string(),
        &buffer,
        options,
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, MessageDef};

    #[test]
    fn report_serializes_regions_with_numeric_wire_types() {
        let schema = SchemaSource::new()
            .message(
                MessageDef::new("demo.Person")
                    .field(FieldDef::new(1, "name", "string"))
                    .field(FieldDef::new(2, "id", "int32")),
            )
            .bind()
            .expect("schema");
        let report = inspect_bytes(
            &schema,
            "demo.Person",
            "person.bin",
            &[0x0a, 0x02, b'A', b'l', 0x10, 0x07],
            DecodeOptions::default(),
        )
        .expect("decode");

        let value = serde_json::to_value(&report).expect("report json");
        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["generated_at"], DEFAULT_GENERATED_AT);
        assert_eq!(value["root_type"], "demo.Person");
        assert_eq!(value["value"]["name"], "Al");
        let id = &value["regions"][1];
        assert_eq!(id["path"], "id");
        assert_eq!(id["wire_type"], 0);
        assert_eq!(id["start"], 4);
        assert_eq!(id["end"], 6);
    }

    #[test]
    fn inspect_file_requires_a_root_type() {
        let schema = SchemaSource::new()
            .message(MessageDef::new("demo.Ping"))
            .bind()
            .expect("schema");
        let err = inspect_file(
            &schema,
            None,
            Path::new("does-not-matter.bin"),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InspectError::MissingRootType));
    }
}
