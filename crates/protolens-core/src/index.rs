//! Queries over a decoded region list.
//!
//! All functions are pure and rely on the list being in emission order
//! (pre-order, depth-first), which is how the decoder produces it.

use crate::decode::ByteRegion;

/// Most specific region containing `byte_index`.
///
/// Among containing regions the smallest span wins; equal spans resolve to
/// the first one in recording order.
///
/// # Examples
/// ```
/// use protolens_core::decode::decode;
/// use protolens_core::index::find_region_by_byte;
/// use protolens_core::schema::{FieldDef, MessageDef, SchemaSource};
///
/// let schema = SchemaSource::new()
///     .message(MessageDef::new("Outer").field(FieldDef::new(1, "inner", "Inner")))
///     .message(MessageDef::new("Inner").field(FieldDef::new(1, "id", "int32")))
///     .bind()?;
/// let output = decode(&schema, "Outer", &[0x0a, 0x02, 0x08, 0x05])?;
/// assert_eq!(find_region_by_byte(&output.regions, 0).unwrap().path, "inner");
/// assert_eq!(find_region_by_byte(&output.regions, 3).unwrap().path, "inner.id");
/// assert!(find_region_by_byte(&output.regions, 4).is_none());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn find_region_by_byte(regions: &[ByteRegion], byte_index: usize) -> Option<&ByteRegion> {
    let mut best: Option<&ByteRegion> = None;
    for region in regions.iter().filter(|region| region.contains(byte_index)) {
        match best {
            Some(current) if current.len() <= region.len() => {}
            _ => best = Some(region),
        }
    }
    best
}

/// Regions whose path equals `path`, in recording order.
///
/// Usually at most one; unknown fields that repeat share a path.
pub fn find_regions_by_path<'r>(regions: &'r [ByteRegion], path: &str) -> Vec<&'r ByteRegion> {
    regions.iter().filter(|region| region.path == path).collect()
}

/// Every region containing `byte_index`, outermost first.
pub fn regions_containing(regions: &[ByteRegion], byte_index: usize) -> Vec<&ByteRegion> {
    regions
        .iter()
        .filter(|region| region.contains(byte_index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{find_region_by_byte, find_regions_by_path, regions_containing};
    use crate::decode::{ByteRegion, DecodedValue, SkipReason};
    use crate::wire::WireType;

    fn region(start: usize, end: usize, path: &str) -> ByteRegion {
        ByteRegion {
            start,
            end,
            path: path.to_string(),
            field_name: path.to_string(),
            type_label: "unknown".to_string(),
            wire_type: WireType::Varint,
            depth: 0,
            value: DecodedValue::Skipped(SkipReason::UnknownField),
        }
    }

    #[test]
    fn picks_smallest_containing_span() {
        let regions = vec![
            region(0, 10, "outer"),
            region(2, 6, "outer.a"),
            region(6, 10, "outer.b"),
        ];
        assert_eq!(find_region_by_byte(&regions, 3).unwrap().path, "outer.a");
        assert_eq!(find_region_by_byte(&regions, 6).unwrap().path, "outer.b");
        assert_eq!(find_region_by_byte(&regions, 1).unwrap().path, "outer");
        assert!(find_region_by_byte(&regions, 10).is_none());
    }

    #[test]
    fn equal_spans_resolve_to_first_recorded() {
        let regions = vec![region(0, 4, "first"), region(0, 4, "second")];
        assert_eq!(find_region_by_byte(&regions, 2).unwrap().path, "first");
    }

    #[test]
    fn empty_list_has_no_match() {
        assert!(find_region_by_byte(&[], 0).is_none());
        assert!(find_regions_by_path(&[], "a").is_empty());
    }

    #[test]
    fn path_lookup_is_exact_and_ordered() {
        let regions = vec![
            region(0, 2, "unknown_9"),
            region(2, 4, "unknown_90"),
            region(4, 6, "unknown_9"),
        ];
        let found = find_regions_by_path(&regions, "unknown_9");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[1].start, 4);
    }

    #[test]
    fn containing_lists_ancestors_first() {
        let regions = vec![region(0, 10, "outer"), region(2, 6, "outer.a")];
        let chain: Vec<_> = regions_containing(&regions, 4)
            .into_iter()
            .map(|region| region.path.as_str())
            .collect();
        assert_eq!(chain, ["outer", "outer.a"]);
    }
}
