/// Stateless "next after cursor" traversal
use crate::catalog::DogId;

/// Smallest id in `sequence` strictly greater than `cursor`.
///
/// `sequence` must be sorted ascending. The cursor is an exclusive lower
/// bound and need not be a member of the sequence.
pub fn next_after(sequence: &[DogId], cursor: DogId) -> Option<DogId> {
    let index = sequence.partition_point(|&id| id <= cursor);
    sequence.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence() {
        assert_eq!(next_after(&[], 0), None);
        assert_eq!(next_after(&[], -1), None);
    }

    #[test]
    fn test_cursor_below_everything_returns_first() {
        assert_eq!(next_after(&[3, 7, 9], 0), Some(3));
        assert_eq!(next_after(&[3, 7, 9], -1), Some(3));
    }

    #[test]
    fn test_liked_sequence_walk() {
        assert_eq!(next_after(&[1, 2], 1), Some(2));
        assert_eq!(next_after(&[1, 2], 2), None);
        assert_eq!(next_after(&[1, 2], 50), None);
    }

    #[test]
    fn test_cursor_need_not_be_member() {
        // Dog 5 was decided in the meantime and dropped out of the sequence
        assert_eq!(next_after(&[2, 4, 8, 16], 5), Some(8));
        assert_eq!(next_after(&[2, 4, 8, 16], 15), Some(16));
    }

    #[test]
    fn test_matches_linear_scan_and_is_monotonic() {
        let sequence: Vec<DogId> = vec![1, 4, 5, 9, 12, 13, 20];

        let mut previous: Option<DogId> = None;
        for cursor in -2..25 {
            let expected = sequence.iter().copied().find(|&id| id > cursor);
            let actual = next_after(&sequence, cursor);
            assert_eq!(actual, expected, "cursor {}", cursor);

            if let (Some(prev), Some(current)) = (previous, actual) {
                assert!(prev <= current);
            }
            if actual.is_some() {
                previous = actual;
            }
        }
    }
}
