use log::{debug, warn};

use super::error::{DecodeErrorKind, DecodeFailure};
use super::path;
use super::region::ByteRegion;
use super::value::{DecodedValue, MessageValue, ScalarValue, SkipReason};
use crate::schema::{
    EnumId, FieldDescriptor, FieldKind, MessageDescriptor, MessageId, ScalarKind, Schema,
};
use crate::wire::{WireError, WireReader, WireType};

/// Default nesting limit, matching common wire-format parsers.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest nested message accepted; the root message's fields are at 0.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Value tree and region list produced by one decode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    pub value: DecodedValue,
    /// Regions in pre-order, depth-first emission order.
    pub regions: Vec<ByteRegion>,
}

/// Region-tracking decoder bound to one schema.
///
/// # Examples
/// ```
/// use protolens_core::decode::RegionDecoder;
/// use protolens_core::schema::{FieldDef, MessageDef, SchemaSource};
///
/// let schema = SchemaSource::new()
///     .message(
///         MessageDef::new("demo.Person")
///             .field(FieldDef::new(1, "name", "string"))
///             .field(FieldDef::new(2, "id", "int32")),
///     )
///     .bind()?;
/// let output = RegionDecoder::new(&schema).decode("demo.Person", &[0x0a, 0x02, b'A', b'l', 0x10, 0x07])?;
/// assert_eq!(serde_json::to_string(&output.value)?, r#"{"name":"Al","id":7}"#);
/// assert_eq!(output.regions[1].path, "id");
/// assert_eq!(output.regions[1].range(), 4..6);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RegionDecoder<'s> {
    schema: &'s Schema,
    options: DecodeOptions,
}

impl<'s> RegionDecoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_options(schema, DecodeOptions::default())
    }

    pub fn with_options(schema: &'s Schema, options: DecodeOptions) -> Self {
        Self { schema, options }
    }

    /// Decode `buffer` as one instance of the message named `root`.
    ///
    /// # Errors
    /// Returns `DecodeFailure` when `root` is not in the schema or the buffer
    /// is malformed; nothing partial is returned.
    pub fn decode(&self, root: &str, buffer: &[u8]) -> Result<DecodeOutput, DecodeFailure> {
        let root_id = self
            .schema
            .message_by_name(root)
            .ok_or_else(|| DecodeFailure {
                type_name: root.to_string(),
                field_number: None,
                offset: 0,
                kind: DecodeErrorKind::UnknownRootType {
                    name: root.to_string(),
                },
            })?;
        self.decode_message(root_id, buffer)
    }

    pub fn decode_message(
        &self,
        root: MessageId,
        buffer: &[u8],
    ) -> Result<DecodeOutput, DecodeFailure> {
        let mut walk = Walk {
            schema: self.schema,
            max_depth: self.options.max_depth,
            reader: WireReader::new(buffer),
            regions: Vec::new(),
        };
        let value = walk.message(root, buffer.len(), "", 0)?;
        debug!(
            "decoded {} bytes as {} into {} regions",
            buffer.len(),
            self.schema.message(root).name(),
            walk.regions.len()
        );
        Ok(DecodeOutput {
            value: DecodedValue::Message(value),
            regions: walk.regions,
        })
    }
}

/// Decode with default options.
pub fn decode(schema: &Schema, root: &str, buffer: &[u8]) -> Result<DecodeOutput, DecodeFailure> {
    RegionDecoder::new(schema).decode(root, buffer)
}

/// Element type a scalar-like field decodes to.
#[derive(Debug, Clone, Copy)]
enum Element {
    Scalar(ScalarKind),
    Enum(EnumId),
}

impl Element {
    fn of(field: &FieldDescriptor) -> Option<Self> {
        match field.kind() {
            FieldKind::Scalar(kind) => Some(Element::Scalar(kind)),
            FieldKind::Enum(id) => Some(Element::Enum(id)),
            _ => None,
        }
    }

    fn wire_type(self) -> WireType {
        match self {
            Element::Scalar(kind) => kind.wire_type(),
            Element::Enum(_) => WireType::Varint,
        }
    }

    fn is_packable(self) -> bool {
        match self {
            Element::Scalar(kind) => kind.is_packable(),
            Element::Enum(_) => true,
        }
    }
}

/// Where the current field occurrence started and how it is framed.
#[derive(Debug, Clone, Copy)]
struct Site {
    start: usize,
    wire_type: WireType,
    depth: usize,
}

/// State of one decode pass: the single shared cursor and the flat region
/// list every nesting level appends to.
struct Walk<'a, 's> {
    schema: &'s Schema,
    max_depth: usize,
    reader: WireReader<'a>,
    regions: Vec<ByteRegion>,
}

impl Walk<'_, '_> {
    fn message(
        &mut self,
        id: MessageId,
        end: usize,
        path: &str,
        depth: usize,
    ) -> Result<MessageValue, DecodeFailure> {
        let schema = self.schema;
        let descriptor = schema.message(id);
        let mut value = MessageValue::new();

        while self.reader.position() < end {
            let start = self.reader.position();
            let (number, wire_type) = self
                .reader
                .read_tag()
                .map_err(|err| wire_failure(descriptor, None, err))?;
            let after_tag = self.reader.position();
            if after_tag > end {
                return Err(failure(
                    descriptor,
                    Some(number),
                    start,
                    DecodeErrorKind::OutOfBounds {
                        needed: after_tag - start,
                        available: end - start,
                    },
                ));
            }

            let site = Site {
                start,
                wire_type,
                depth,
            };
            match descriptor.field_by_number(number) {
                None => self.unknown_field(descriptor, &mut value, number, site, path)?,
                Some(field) => {
                    self.known_field(descriptor, field, &mut value, site, end, path)?
                }
            }

            let actual = self.reader.position();
            if actual > end {
                return Err(failure(
                    descriptor,
                    Some(number),
                    start,
                    DecodeErrorKind::BoundaryMismatch {
                        expected: end,
                        actual,
                    },
                ));
            }
        }

        Ok(value)
    }

    fn unknown_field(
        &mut self,
        descriptor: &MessageDescriptor,
        value: &mut MessageValue,
        number: u32,
        site: Site,
        path: &str,
    ) -> Result<(), DecodeFailure> {
        let field_name = format!("unknown_{number}");
        self.skip(descriptor, number, site.wire_type)?;
        debug!(
            "unknown field {} in {} at offset {}",
            number,
            descriptor.name(),
            site.start
        );

        let placeholder = DecodedValue::Skipped(SkipReason::UnknownField);
        value.set(&field_name, placeholder.clone());
        let field_path = path::child(path, &field_name);
        self.emit(site, field_path, field_name, "unknown".to_string(), placeholder);
        Ok(())
    }

    fn known_field(
        &mut self,
        descriptor: &MessageDescriptor,
        field: &FieldDescriptor,
        value: &mut MessageValue,
        site: Site,
        end: usize,
        path: &str,
    ) -> Result<(), DecodeFailure> {
        let element = Element::of(field);
        match field.kind() {
            FieldKind::Map => {
                self.skip(descriptor, field.id(), site.wire_type)?;
                warn!(
                    "map field {}.{} skipped at offset {}",
                    descriptor.name(),
                    field.name(),
                    site.start
                );
                let placeholder = DecodedValue::Skipped(SkipReason::MapField);
                value.set(field.name(), placeholder.clone());
                self.emit_field(site, path::child(path, field.name()), field, placeholder);
                Ok(())
            }
            FieldKind::Message(nested) if site.wire_type == WireType::LengthDelimited => {
                self.nested_message(descriptor, field, nested, value, site, end, path)
            }
            _ => match element {
                Some(element)
                    if site.wire_type == WireType::LengthDelimited
                        && field.is_repeated()
                        && element.is_packable() =>
                {
                    self.packed_field(descriptor, field, element, value, site, end, path)
                }
                Some(element) if site.wire_type == element.wire_type() => {
                    let item = self
                        .read_element(element)
                        .map_err(|err| wire_failure(descriptor, Some(field.id()), err))?;
                    let item = DecodedValue::Scalar(item);
                    let item_path = place(value, field, path, item.clone());
                    self.emit_field(site, item_path, field, item);
                    Ok(())
                }
                Some(_) => {
                    let reason = SkipReason::WireTypeMismatch;
                    self.skip_field(descriptor, field, value, site, path, reason)
                }
                None => {
                    let reason = match field.kind() {
                        FieldKind::Message(_) => SkipReason::WireTypeMismatch,
                        _ => SkipReason::UnsupportedType,
                    };
                    self.skip_field(descriptor, field, value, site, path, reason)
                }
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn nested_message(
        &mut self,
        descriptor: &MessageDescriptor,
        field: &FieldDescriptor,
        nested: MessageId,
        value: &mut MessageValue,
        site: Site,
        end: usize,
        path: &str,
    ) -> Result<(), DecodeFailure> {
        let length = self
            .reader
            .read_length()
            .map_err(|err| wire_failure(descriptor, Some(field.id()), err))?;
        let body_start = self.reader.position();
        let msg_end = body_start + length;
        if msg_end > end {
            return Err(failure(
                descriptor,
                Some(field.id()),
                body_start,
                DecodeErrorKind::BoundaryMismatch {
                    expected: end,
                    actual: msg_end,
                },
            ));
        }
        if site.depth + 1 > self.max_depth {
            return Err(failure(
                descriptor,
                Some(field.id()),
                site.start,
                DecodeErrorKind::DepthLimitExceeded {
                    limit: self.max_depth,
                },
            ));
        }

        let field_path = path::child(path, field.name());
        let item_path = if field.is_repeated() {
            path::element(&field_path, value.next_index(field.name()))
        } else {
            field_path
        };

        debug!(
            "entering {} for {} at offset {} (depth {})",
            self.schema.message(nested).name(),
            item_path,
            site.start,
            site.depth + 1
        );
        // The nested region precedes its children in the list, so reserve its
        // slot before recursing.
        let slot = self.regions.len();
        let message = self.message(nested, msg_end, &item_path, site.depth + 1)?;
        let item = DecodedValue::Message(message);
        if field.is_repeated() {
            value.push_repeated(field.name(), item.clone());
        } else {
            value.set(field.name(), item.clone());
        }

        let region = self.region(
            site,
            item_path,
            field.name().to_string(),
            field.type_name().to_string(),
            item,
        );
        self.regions.insert(slot, region);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn packed_field(
        &mut self,
        descriptor: &MessageDescriptor,
        field: &FieldDescriptor,
        element: Element,
        value: &mut MessageValue,
        site: Site,
        end: usize,
        path: &str,
    ) -> Result<(), DecodeFailure> {
        let length = self
            .reader
            .read_length()
            .map_err(|err| wire_failure(descriptor, Some(field.id()), err))?;
        let packed_end = self.reader.position() + length;
        if packed_end > end {
            return Err(failure(
                descriptor,
                Some(field.id()),
                self.reader.position(),
                DecodeErrorKind::BoundaryMismatch {
                    expected: end,
                    actual: packed_end,
                },
            ));
        }

        let mut items = Vec::new();
        while self.reader.position() < packed_end {
            let item = self
                .read_element(element)
                .map_err(|err| wire_failure(descriptor, Some(field.id()), err))?;
            items.push(DecodedValue::Scalar(item));
        }
        let actual = self.reader.position();
        if actual != packed_end {
            return Err(failure(
                descriptor,
                Some(field.id()),
                actual,
                DecodeErrorKind::BoundaryMismatch {
                    expected: packed_end,
                    actual,
                },
            ));
        }

        let sequence = value.extend_repeated(field.name(), items).clone();
        let type_label = format!("packed {}", field.type_name());
        let region = self.region(
            site,
            path::child(path, field.name()),
            field.name().to_string(),
            type_label,
            sequence,
        );
        self.regions.push(region);
        Ok(())
    }

    fn skip_field(
        &mut self,
        descriptor: &MessageDescriptor,
        field: &FieldDescriptor,
        value: &mut MessageValue,
        site: Site,
        path: &str,
        reason: SkipReason,
    ) -> Result<(), DecodeFailure> {
        self.skip(descriptor, field.id(), site.wire_type)?;
        warn!(
            "field {}.{} ({}, wire type {}) skipped at offset {}: {}",
            descriptor.name(),
            field.name(),
            field.type_name(),
            site.wire_type,
            site.start,
            reason.as_str()
        );
        let placeholder = DecodedValue::Skipped(reason);
        let item_path = place(value, field, path, placeholder.clone());
        self.emit_field(site, item_path, field, placeholder);
        Ok(())
    }

    fn read_element(&mut self, element: Element) -> Result<ScalarValue, WireError> {
        match element {
            Element::Scalar(kind) => kind.read(&mut self.reader),
            Element::Enum(id) => {
                let number = self.reader.read_varint()? as i32;
                let name = self
                    .schema
                    .enum_type(id)
                    .value_name(number)
                    .map(str::to_string);
                Ok(ScalarValue::Enum { number, name })
            }
        }
    }

    fn skip(
        &mut self,
        descriptor: &MessageDescriptor,
        number: u32,
        wire_type: WireType,
    ) -> Result<(), DecodeFailure> {
        self.reader
            .skip(wire_type)
            .map_err(|err| wire_failure(descriptor, Some(number), err))
    }

    fn emit_field(
        &mut self,
        site: Site,
        path: String,
        field: &FieldDescriptor,
        value: DecodedValue,
    ) {
        self.emit(
            site,
            path,
            field.name().to_string(),
            field.type_name().to_string(),
            value,
        );
    }

    fn emit(
        &mut self,
        site: Site,
        path: String,
        field_name: String,
        type_label: String,
        value: DecodedValue,
    ) {
        let region = self.region(site, path, field_name, type_label, value);
        self.regions.push(region);
    }

    fn region(
        &self,
        site: Site,
        path: String,
        field_name: String,
        type_label: String,
        value: DecodedValue,
    ) -> ByteRegion {
        ByteRegion {
            start: site.start,
            end: self.reader.position(),
            path,
            field_name,
            type_label,
            wire_type: site.wire_type,
            depth: site.depth,
            value,
        }
    }
}

/// Store a non-message item under `field` and return the item's path.
fn place(
    value: &mut MessageValue,
    field: &FieldDescriptor,
    path: &str,
    item: DecodedValue,
) -> String {
    let field_path = path::child(path, field.name());
    if field.is_repeated() {
        let index = value.push_repeated(field.name(), item);
        path::element(&field_path, index)
    } else {
        value.set(field.name(), item);
        field_path
    }
}

fn failure(
    descriptor: &MessageDescriptor,
    field_number: Option<u32>,
    offset: usize,
    kind: DecodeErrorKind,
) -> DecodeFailure {
    DecodeFailure {
        type_name: descriptor.name().to_string(),
        field_number,
        offset,
        kind,
    }
}

fn wire_failure(
    descriptor: &MessageDescriptor,
    field_number: Option<u32>,
    err: WireError,
) -> DecodeFailure {
    failure(descriptor, field_number, err.offset(), err.into())
}
