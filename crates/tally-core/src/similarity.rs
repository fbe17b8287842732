//! Sequence similarity for fuzzy merchant matching
//!
//! Ratcliff/Obershelp "gestalt" matching: find the longest common block,
//! recurse on the pieces left and right of it, and score
//! `2 * matched / total` on a 0-100 scale.

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Returns `(i, j, size)`. Among blocks of equal size the one ending earliest
/// in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j + 1] = length of the common run ending at a[i - 1], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                curr[j + 1] = k;
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            } else {
                curr[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

/// Total size of all matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Similarity ratio between two strings, 0-100
///
/// Two empty strings score 0; nothing is considered similar to nothing.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    200.0 * matching_characters(&a, &b) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("AGROBAZAR", "AGROBAZAR"), 100.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(ratio("ABC", "XYZ"), 0.0);
        assert_eq!(ratio("", ""), 0.0);
        assert_eq!(ratio("ABC", ""), 0.0);
    }

    #[test]
    fn test_single_substitution() {
        // 9 of 10 characters line up on each side
        assert_eq!(ratio("AGROBAZARX", "AGROBAZARY"), 90.0);
    }

    #[test]
    fn test_known_values() {
        // Matching blocks "a", "b" and "d" give 2 * 3 / 8
        assert_eq!(ratio("abcd", "acbd"), 75.0);
        assert_eq!(ratio("FARMACIA", "FARMACIE"), 87.5);
    }

    #[test]
    fn test_recursion_finds_blocks_on_both_sides() {
        // "AGRO" and "BAZAR" around a dropped dot
        let score = ratio("AGRO.BAZAR", "AGROBAZAR");
        assert!((score - 200.0 * 9.0 / 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_for_simple_cases() {
        assert_eq!(ratio("MARKET", "MARKT"), ratio("MARKT", "MARKET"));
    }
}
