// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display-name compression.
//!
//! CAD and BIM exporters name instances like `"Basic Wall [184224]"` (Revit)
//! or `"Crank Shaft:7"` (Inventor). Splitting off the trailing integer lets
//! thousands of instances share one pooled base string while each node keeps
//! only its own suffix.
//!
//! The separator stays on the base (`"Basic Wall ["`, `"Crank Shaft:"`) so the
//! original text can be rebuilt without remembering which form was used.

use std::borrow::Cow;

/// Splits `name` into a pooled base and a nonzero numeric suffix.
///
/// Returns `(name, 0)` whenever the split would not round-trip exactly:
/// no separator, an empty or non-numeric suffix, leading zeros, an explicit
/// `+` sign, a zero value, or a value outside `i32`.
pub fn split_name(name: &str) -> (&str, i32) {
    let Some((base_end, suffix_end)) = suffix_span(name) else {
        return (name, 0);
    };

    let digits = &name[base_end..suffix_end];
    match digits.parse::<i32>() {
        Ok(suffix) if suffix != 0 && suffix.to_string() == digits => (&name[..base_end], suffix),
        _ => (name, 0),
    }
}

/// Rebuilds a display name from its base and suffix.
pub fn compose_name(base: &str, suffix: i32) -> Cow<'_, str> {
    if suffix == 0 {
        Cow::Borrowed(base)
    } else if base.ends_with('[') {
        Cow::Owned(format!("{base}{suffix}]"))
    } else {
        Cow::Owned(format!("{base}{suffix}"))
    }
}

/// Byte range of the candidate suffix: `(base_end, suffix_end)`.
///
/// The bracket form only applies when `]` is the final character, so no text
/// after the closing bracket can be lost. Otherwise the last `:` is used.
fn suffix_span(name: &str) -> Option<(usize, usize)> {
    if let Some(close) = name.len().checked_sub(1).filter(|_| name.ends_with(']')) {
        if let Some(open) = name[..close].rfind('[') {
            return Some((open + 1, close));
        }
    }
    name.rfind(':').map(|colon| (colon + 1, name.len()))
}
