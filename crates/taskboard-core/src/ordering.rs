//! Manual ordering of sibling projects and stories.
//!
//! Sibling `sort_order` values are kept contiguous from zero after every
//! reorder so the index in the list is the order value.

use std::collections::HashSet;

use crate::validate::ValidationError;

/// Move `id` to `position` within `siblings`, shifting the rest.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownSibling`] if `id` is not in
/// `siblings`, or [`ValidationError::PositionOutOfRange`] if `position`
/// is past the last slot.
pub fn move_to_position(
    siblings: &[String],
    id: &str,
    position: usize,
) -> Result<Vec<String>, ValidationError> {
    let Some(from) = siblings.iter().position(|s| s == id) else {
        return Err(ValidationError::UnknownSibling { id: id.to_string() });
    };
    if position >= siblings.len() {
        return Err(ValidationError::PositionOutOfRange {
            position,
            len: siblings.len(),
        });
    }

    let mut ordered = siblings.to_vec();
    let moved = ordered.remove(from);
    ordered.insert(position, moved);
    Ok(ordered)
}

/// Pair each id in `requested` with its new `sort_order`.
///
/// `requested` must be a permutation of `current`.
///
/// # Errors
///
/// Returns [`ValidationError::IncompleteOrdering`] when an id is missing,
/// repeated, or not a current sibling.
pub fn reorder_assignments<'a>(
    current: &[String],
    requested: &'a [String],
) -> Result<Vec<(&'a str, i64)>, ValidationError> {
    let known: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id.as_str()) || !seen.insert(id.as_str()) {
            return Err(ValidationError::IncompleteOrdering);
        }
    }
    if seen.len() != known.len() {
        return Err(ValidationError::IncompleteOrdering);
    }

    Ok(requested
        .iter()
        .zip(0_i64..)
        .map(|(id, order)| (id.as_str(), order))
        .collect())
}

/// Order value for a new last sibling: one past the current maximum.
#[must_use]
pub fn next_sort_order(existing: impl IntoIterator<Item = i64>) -> i64 {
    existing.into_iter().max().map_or(0, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn move_up_shifts_others_down() {
        let siblings = ids(&["a", "b", "c", "d"]);
        let moved = move_to_position(&siblings, "c", 0).unwrap();
        assert_eq!(moved, ids(&["c", "a", "b", "d"]));

        let assigned = reorder_assignments(&siblings, &moved).unwrap();
        let orders: Vec<i64> = assigned.iter().map(|(_, o)| *o).collect();
        assert_eq!(orders, [0, 1, 2, 3]);
        assert_eq!(assigned[0], ("c", 0));
    }

    #[test]
    fn move_down_to_last_slot() {
        let siblings = ids(&["a", "b", "c"]);
        assert_eq!(
            move_to_position(&siblings, "a", 2).unwrap(),
            ids(&["b", "c", "a"])
        );
    }

    #[test]
    fn move_rejects_bad_input() {
        let siblings = ids(&["a", "b"]);
        assert_eq!(
            move_to_position(&siblings, "z", 0),
            Err(ValidationError::UnknownSibling { id: "z".into() })
        );
        assert_eq!(
            move_to_position(&siblings, "a", 2),
            Err(ValidationError::PositionOutOfRange { position: 2, len: 2 })
        );
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let current = ids(&["a", "b", "c"]);
        assert!(reorder_assignments(&current, &ids(&["a", "b"])).is_err());
        assert!(reorder_assignments(&current, &ids(&["a", "b", "b"])).is_err());
        assert!(reorder_assignments(&current, &ids(&["a", "b", "x"])).is_err());
        assert!(reorder_assignments(&current, &ids(&["c", "a", "b"])).is_ok());
    }

    #[test]
    fn next_order_appends() {
        assert_eq!(next_sort_order([]), 0);
        assert_eq!(next_sort_order([0, 4, 2]), 5);
    }
}
