use std::collections::HashSet;
use std::hash::Hash;

/// Drop rows equal to an earlier row, keeping first occurrences in order.
pub fn distinct<T: Hash + Eq + Clone>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let rows = vec!["b", "a", "b", "c", "a"];
        assert_eq!(distinct(rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_input() {
        assert!(distinct(Vec::<u8>::new()).is_empty());
    }
}
