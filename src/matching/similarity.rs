use std::cmp::Ordering;

/// Cost of replacing one element by another; never cheaper than delete + insert
const SUBSTITUTION_COST: usize = 2;

/// Levenshtein distance with unit insert/delete and substitution cost 2
pub fn edit_distance<K: PartialEq>(a: &[K], b: &[K]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = previous[j] + if x == y { 0 } else { SUBSTITUTION_COST };
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Edit distance that treats a repeating cycle and any of its rotations alike
///
/// The longer sequence is doubled so every rotation of it is a contiguous
/// substring; aligning the shorter one against the doubled string therefore
/// picks the best phase. The doubled half that cannot match costs exactly
/// `len(long)` deletions and is subtracted again. Equal-length inputs are
/// ordered by value so the result does not depend on argument order.
///
/// ```
/// use loggraph::matching::cyclic_edit_distance;
///
/// assert_eq!(cyclic_edit_distance(&[1, 2, 3], &[3, 1, 2]), 0);
/// assert_eq!(cyclic_edit_distance(&[1, 2, 1, 2], &[1, 2]), 2);
/// ```
pub fn cyclic_edit_distance<K: Ord>(a: &[K], b: &[K]) -> usize {
    let (long, short) = match a.len().cmp(&b.len()).then_with(|| a.cmp(b)) {
        Ordering::Less => (b, a),
        _ => (a, b),
    };

    let doubled: Vec<&K> = long.iter().chain(long.iter()).collect();
    let short: Vec<&K> = short.iter().collect();
    edit_distance(&doubled, &short).saturating_sub(long.len())
}

/// `1 - distance / (len(a) + len(b))`; two empty sequences are identical
pub fn similarity<K: Ord>(a: &[K], b: &[K]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    1.0 - cyclic_edit_distance(a, b) as f64 / total as f64
}
