//! Identifier casing transforms.
//!
//! Logical table names use camelCase, physical SQL table names use
//! snake_case. The two transforms here are inverse to each other for
//! all-ASCII identifiers following those conventions (no digits adjacent
//! to case boundaries).

/// Converts a camelCase identifier to snake_case.
///
/// An underscore is inserted before each internal uppercase letter and the
/// whole identifier is lowercased: `systemConfig` -> `system_config`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts a snake_case identifier to camelCase.
///
/// Each underscore followed by a letter becomes the uppercased letter with
/// the underscore removed: `system_config` -> `systemConfig`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
