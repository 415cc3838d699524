// SPDX-License-Identifier: GPL-3.0-only
//! Levenshtein edit distance, the word alignment built on top of it, and a
//! matching-blocks similarity ratio for individual words.

/// One step of an edit script turning `expected` into `spoken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// `expected[i] == spoken[j]`
    Equal { expected: usize, spoken: usize },
    /// `expected[i]` was said as `spoken[j]`
    Replace { expected: usize, spoken: usize },
    /// `expected[i]` was not said
    Delete { expected: usize },
    /// `spoken[j]` has no counterpart in `expected`
    Insert { spoken: usize },
}

/// Build the full dynamic-programming matrix for `a` against `b`.
///
/// `matrix[i][j]` is the edit distance between `a[..i]` and `b[..j]`.
fn edit_matrix<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; b.len() + 1]; a.len() + 1];

    // Initialize first column
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    // Initialize first row
    if let Some(first_row) = matrix.get_mut(0) {
        for (j, cell) in first_row.iter_mut().enumerate() {
            *cell = j;
        }
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1) // deletion
                .min(matrix[i][j - 1] + 1) // insertion
                .min(matrix[i - 1][j - 1] + cost); // substitution
        }
    }

    matrix
}

/// Levenshtein distance between two sequences with unit costs.
#[must_use]
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    edit_matrix(a, b)[a.len()][b.len()]
}

/// Levenshtein distance between two strings, counted in chars.
#[must_use]
pub fn char_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein(&a, &b)
}

/// Similarity in `[0.0, 1.0]` computed as `(max_len - distance) / max_len`.
///
/// Two empty strings are identical (1.0); one empty string against a
/// non-empty one shares nothing (0.0).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn char_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = char_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Ties go to the run starting earliest in `a`, then earliest in `b`.
fn longest_match<T: PartialEq>(
    a: &[T],
    b: &[T],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // prev[k] is the run length ending at (i - 1, blo + k - 1)
    let mut prev = vec![0; bhi - blo + 1];

    for i in alo..ahi {
        let mut current = vec![0; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let len = prev[j - blo] + 1;
                current[j - blo + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = current;
    }

    best
}

/// Total length of the matching blocks found by repeatedly taking the
/// longest common run and recursing on both sides of it.
fn matching_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut total = 0;
    let mut pending = vec![((0, a.len()), (0, b.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        if alo >= ahi || blo >= bhi {
            continue;
        }
        let (i, j, len) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if len == 0 {
            continue;
        }
        total += len;
        pending.push(((alo, i), (blo, j)));
        pending.push(((i + len, ahi), (j + len, bhi)));
    }

    total
}

/// Matching-blocks ratio `2 * M / (len(a) + len(b))` over chars, where `M`
/// is the total length of the matching blocks.
///
/// Unlike [`char_similarity`], a transposition keeps most of its credit:
/// `from` against `form` is 0.75. Two empty strings give 1.0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn match_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matching_length(&a, &b)) as f64 / total as f64
}

/// Minimal edit script from `expected` to `spoken`, in expected order.
///
/// On ties the backtrace prefers equal/replace over delete over insert,
/// so a substituted word is reported as a replacement rather than a
/// delete followed by an insert.
#[must_use]
pub fn align<T: PartialEq>(expected: &[T], spoken: &[T]) -> Vec<EditOp> {
    let matrix = edit_matrix(expected, spoken);
    let mut ops = Vec::with_capacity(expected.len().max(spoken.len()));

    let (mut i, mut j) = (expected.len(), spoken.len());
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let same = expected[i - 1] == spoken[j - 1];
            let diagonal = matrix[i - 1][j - 1] + usize::from(!same);
            if matrix[i][j] == diagonal {
                ops.push(if same {
                    EditOp::Equal {
                        expected: i - 1,
                        spoken: j - 1,
                    }
                } else {
                    EditOp::Replace {
                        expected: i - 1,
                        spoken: j - 1,
                    }
                });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && matrix[i][j] == matrix[i - 1][j] + 1 {
            ops.push(EditOp::Delete { expected: i - 1 });
            i -= 1;
        } else {
            ops.push(EditOp::Insert { spoken: j - 1 });
            j -= 1;
        }
    }

    ops.reverse();
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_distance() {
        assert_eq!(char_distance("kitten", "sitting"), 3);
        assert_eq!(char_distance("hello", "helo"), 1);
        assert_eq!(char_distance("", "abc"), 3);
        assert_eq!(char_distance("abc", ""), 3);
        assert_eq!(char_distance("", ""), 0);
        assert_eq!(char_distance("same", "same"), 0);
    }

    #[test]
    fn test_char_distance_counts_chars_not_bytes() {
        // Each Cyrillic letter is two bytes in UTF-8
        assert_eq!(char_distance("привіт", "привет"), 1);
        assert_eq!(char_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_levenshtein_is_symmetric() {
        let pairs = [("goodbye", "hello"), ("flaw", "lawn"), ("a", "abc")];
        for (a, b) in pairs {
            assert_eq!(char_distance(a, b), char_distance(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_levenshtein_over_words() {
        let expected = ["the", "cat", "sat"];
        let spoken = ["the", "cat", "sat", "down"];
        assert_eq!(levenshtein(&expected, &spoken), 1);
    }

    #[test]
    fn test_char_similarity() {
        assert!((char_similarity("hello", "helo") - 0.8).abs() < f64::EPSILON);
        assert!((char_similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(char_similarity("", "hello").abs() < f64::EPSILON);
        assert!(char_similarity("abc", "xyz").abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_ratio_keeps_credit_for_transpositions() {
        // Blocks "f", "r", "m": 2 * 3 / 8
        assert!((match_ratio("from", "form") - 0.75).abs() < f64::EPSILON);
        assert!((char_similarity("from", "form") - 0.5).abs() < f64::EPSILON);

        // Block "bcd" only
        assert!((match_ratio("abcd", "bcda") - 0.75).abs() < f64::EPSILON);
        assert!((match_ratio("lake", "like") - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_ratio_edges() {
        assert!((match_ratio("", "") - 1.0).abs() < f64::EPSILON);
        assert!(match_ratio("abc", "").abs() < f64::EPSILON);
        assert!(match_ratio("abc", "xyz").abs() < f64::EPSILON);
        assert!((match_ratio("same", "same") - 1.0).abs() < f64::EPSILON);
        assert!((match_ratio("привіт", "привет") - 10.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_align_substitution_is_replace() {
        let ops = align(&["i", "like", "cats"], &["i", "lake", "cats"]);
        assert_eq!(
            ops,
            vec![
                EditOp::Equal {
                    expected: 0,
                    spoken: 0
                },
                EditOp::Replace {
                    expected: 1,
                    spoken: 1
                },
                EditOp::Equal {
                    expected: 2,
                    spoken: 2
                },
            ]
        );
    }

    #[test]
    fn test_align_missing_and_extra_words() {
        let ops = align(&["good", "morning", "teacher"], &["good", "teacher"]);
        assert!(ops.contains(&EditOp::Delete { expected: 1 }));

        let ops = align(&["hello"], &["um", "hello"]);
        assert_eq!(
            ops,
            vec![
                EditOp::Insert { spoken: 0 },
                EditOp::Equal {
                    expected: 0,
                    spoken: 1
                },
            ]
        );
    }

    #[test]
    fn test_align_empty_sides() {
        let empty: [&str; 0] = [];
        assert!(align(&empty, &empty).is_empty());
        assert_eq!(
            align(&["a", "b"], &empty),
            vec![EditOp::Delete { expected: 0 }, EditOp::Delete { expected: 1 }]
        );
        assert_eq!(align(&empty, &["a"]), vec![EditOp::Insert { spoken: 0 }]);
    }
}
