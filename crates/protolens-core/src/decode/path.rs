//! Field path construction.
//!
//! Paths join field names with `.` and mark repeated elements with
//! `[index]`, e.g. `addresses[1].city`.

/// Join a child field name onto a parent path.
///
/// # Examples
/// ```
/// use protolens_core::decode::path::{child, element};
///
/// assert_eq!(child("", "name"), "name");
/// assert_eq!(child(&element("addresses", 1), "city"), "addresses[1].city");
/// ```
pub fn child(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Path of the element at `index` of the repeated field at `path`.
pub fn element(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Whether `ancestor` is a strict structural ancestor of `path`.
///
/// A plain string prefix is not enough: `name` is not an ancestor of
/// `names`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{child, element, is_ancestor};

    #[test]
    fn builds_nested_paths() {
        let items = child("order", "items");
        assert_eq!(element(&items, 0), "order.items[0]");
    }

    #[test]
    fn ancestor_requires_separator() {
        assert!(is_ancestor("addresses", "addresses[0]"));
        assert!(is_ancestor("addresses[0]", "addresses[0].city"));
        assert!(!is_ancestor("name", "names"));
        assert!(!is_ancestor("addresses[0]", "addresses[0]"));
        assert!(!is_ancestor("addresses[1]", "addresses[10].city"));
    }
}
