//! Truncation of a single string-shaped field.
//!
//! Lists are processed from their last element backwards and rebuilt into a
//! new list. A scalar string is handled as a one-element list and unwrapped
//! again afterwards.

use cirrus_types::{FieldType, FieldValue, Scalar};

/// Which side of the target length must hold after truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    /// Field length must end at or below the target
    Cap,
    /// Field length must stay at or above the target
    Floor,
}

/// Outcome of truncating one field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Truncated {
    pub value: FieldValue,
    pub removed: usize,
}

/// Largest char boundary of `s` at or below `index`.
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary of `s` at or above `index`.
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Truncate `value` toward `target` bytes, removing at most `max_removal`.
///
/// Returns `None` when nothing was removed or the value is not a string or a
/// list made only of strings.
pub(crate) fn truncate_field(
    value: &FieldValue,
    field_type: FieldType,
    target: usize,
    max_removal: usize,
    bound: Bound,
) -> Option<Truncated> {
    let is_scalar = matches!(value, FieldValue::Scalar(_));
    let elements: Vec<String> = value
        .string_elements()?
        .into_iter()
        .map(str::to_string)
        .collect();

    let total: usize = elements.iter().map(String::len).sum();
    let to_remove = total.saturating_sub(target).min(max_removal);
    if to_remove == 0 {
        return None;
    }

    let kept = match field_type {
        FieldType::Keyword => drop_elements(elements, total, target, to_remove, bound),
        FieldType::Text => cut_text(elements, to_remove, bound),
    };

    let remaining: usize = kept.iter().map(String::len).sum();
    let removed = total - remaining;
    if removed == 0 {
        return None;
    }

    let value = if is_scalar {
        FieldValue::Scalar(Scalar::Str(kept.into_iter().next().unwrap_or_default()))
    } else {
        FieldValue::strings(kept)
    };
    Some(Truncated { value, removed })
}

fn drop_elements(
    mut elements: Vec<String>,
    total: usize,
    target: usize,
    to_remove: usize,
    bound: Bound,
) -> Vec<String> {
    let mut removed = 0;
    while removed < to_remove {
        let Some(last_len) = elements.last().map(String::len) else {
            break;
        };
        if bound == Bound::Floor && total - removed - last_len < target {
            break;
        }
        removed += last_len;
        elements.pop();
    }
    elements
}

fn cut_text(elements: Vec<String>, to_remove: usize, bound: Bound) -> Vec<String> {
    let mut remaining = to_remove;
    let mut kept_reversed = Vec::with_capacity(elements.len());

    for element in elements.into_iter().rev() {
        if remaining == 0 {
            kept_reversed.push(element);
            continue;
        }
        if element.len() <= remaining {
            remaining -= element.len();
            continue;
        }

        let keep = element.len() - remaining;
        let cut = match bound {
            Bound::Cap => floor_char_boundary(&element, keep),
            Bound::Floor => ceil_char_boundary(&element, keep),
        };
        remaining = 0;
        if cut > 0 {
            kept_reversed.push(element[..cut].to_string());
        }
    }

    kept_reversed.reverse();
    kept_reversed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_boundaries() {
        let s = "aé"; // 'é' is two bytes
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(ceil_char_boundary(s, 2), 3);
        assert_eq!(floor_char_boundary(s, 10), 3);
        assert_eq!(ceil_char_boundary(s, 0), 0);
    }

    #[test]
    fn test_cap_scalar_text() {
        let value = FieldValue::from("hello world");
        let result = truncate_field(&value, FieldType::Text, 5, usize::MAX, Bound::Cap).unwrap();
        assert_eq!(result.value, FieldValue::from("hello"));
        assert_eq!(result.removed, 6);
    }

    #[test]
    fn test_cap_never_splits_multibyte() {
        let value = FieldValue::from("ééé"); // 6 bytes
        let result = truncate_field(&value, FieldType::Text, 3, usize::MAX, Bound::Cap).unwrap();
        assert_eq!(result.value, FieldValue::from("é"));
        assert_eq!(result.removed, 4);
    }

    #[test]
    fn test_floor_keeps_minimum_with_multibyte() {
        let value = FieldValue::from("ééé");
        let result = truncate_field(&value, FieldType::Text, 3, usize::MAX, Bound::Floor).unwrap();
        assert_eq!(result.value, FieldValue::from("éé"));
        assert_eq!(result.removed, 2);
    }

    #[test]
    fn test_text_list_cut_from_end_and_empties_removed() {
        let value = FieldValue::strings(["aaaa", "bbbb", "cc"]);
        let result = truncate_field(&value, FieldType::Text, 3, usize::MAX, Bound::Cap).unwrap();
        assert_eq!(result.value, FieldValue::strings(["aaa"]));
        assert_eq!(result.removed, 7);
    }

    #[test]
    fn test_budget_limits_removal() {
        let value = FieldValue::strings(["aaaa", "bbbb"]);
        let result = truncate_field(&value, FieldType::Text, 0, 3, Bound::Floor).unwrap();
        assert_eq!(result.value, FieldValue::strings(["aaaa", "b"]));
        assert_eq!(result.removed, 3);
    }

    #[test]
    fn test_keyword_drops_whole_elements() {
        let value = FieldValue::strings(["alpha", "beta", "gamma"]);
        let result =
            truncate_field(&value, FieldType::Keyword, 6, usize::MAX, Bound::Cap).unwrap();
        assert_eq!(result.value, FieldValue::strings(["alpha"]));
        assert_eq!(result.removed, 9);
    }

    #[test]
    fn test_keyword_floor_stops_before_minimum() {
        let value = FieldValue::strings(["alpha", "beta", "gamma"]);
        let result =
            truncate_field(&value, FieldType::Keyword, 6, usize::MAX, Bound::Floor).unwrap();
        assert_eq!(result.value, FieldValue::strings(["alpha", "beta"]));
        assert_eq!(result.removed, 5);
    }

    #[test]
    fn test_scalar_fully_removed_becomes_empty_string() {
        let value = FieldValue::from("abc");
        let result = truncate_field(&value, FieldType::Text, 0, usize::MAX, Bound::Cap).unwrap();
        assert_eq!(result.value, FieldValue::from(""));
        assert_eq!(result.removed, 3);
    }

    #[test]
    fn test_mixed_and_nested_untouched() {
        let mixed = FieldValue::List(vec![Scalar::from("aaaaaa"), Scalar::Int(1)]);
        assert!(truncate_field(&mixed, FieldType::Text, 0, usize::MAX, Bound::Cap).is_none());

        let nested = FieldValue::Nested(serde_json::json!([{"title": "long title"}]));
        assert!(truncate_field(&nested, FieldType::Text, 0, usize::MAX, Bound::Cap).is_none());

        let number = FieldValue::from(123456i64);
        assert!(truncate_field(&number, FieldType::Text, 0, usize::MAX, Bound::Cap).is_none());
    }

    #[test]
    fn test_within_target_untouched() {
        let value = FieldValue::from("short");
        assert!(truncate_field(&value, FieldType::Text, 10, usize::MAX, Bound::Cap).is_none());
    }
}
