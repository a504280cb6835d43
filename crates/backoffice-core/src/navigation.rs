//! Previous/next navigation between records in ascending id order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Where a record sits among all records of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Position {
    /// 1-based.
    pub index: usize,
    pub total: usize,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
}

/// Locates `target` in `ids`, which must be in ascending order.
///
/// Returns `None` when `target` is not present.
///
/// ```rust
/// use backoffice_core::navigation::position;
///
/// let pos = position(3, &[1, 2, 3, 4, 5]).unwrap();
/// assert_eq!((pos.index, pos.total), (3, 5));
/// assert_eq!((pos.previous_id, pos.next_id), (Some(2), Some(4)));
/// assert!(position(9, &[1, 2, 3]).is_none());
/// ```
pub fn position(target: i64, ids: &[i64]) -> Option<Position> {
    let at = ids.iter().position(|&id| id == target)?;

    Some(Position {
        index: at + 1,
        total: ids.len(),
        previous_id: at.checked_sub(1).map(|i| ids[i]),
        next_id: ids.get(at + 1).copied(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last() {
        let ids = [1, 2, 3, 4, 5];

        let first = position(1, &ids).unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.previous_id, None);
        assert_eq!(first.next_id, Some(2));

        let last = position(5, &ids).unwrap();
        assert_eq!(last.index, 5);
        assert_eq!(last.previous_id, Some(4));
        assert_eq!(last.next_id, None);
    }

    #[test]
    fn test_gaps_in_ids() {
        let pos = position(7, &[2, 7, 40]).unwrap();
        assert_eq!(pos.previous_id, Some(2));
        assert_eq!(pos.next_id, Some(40));
        assert_eq!(pos.total, 3);
    }

    #[test]
    fn test_single_and_empty() {
        let only = position(4, &[4]).unwrap();
        assert_eq!((only.index, only.total), (1, 1));
        assert_eq!((only.previous_id, only.next_id), (None, None));

        assert!(position(1, &[]).is_none());
    }
}
