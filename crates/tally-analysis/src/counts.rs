//! Frequency tables over cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tally_types::{Cell, CellKey};

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Non-null values with their counts, in order of first appearance.
pub fn frequencies(cells: &[Cell]) -> Vec<(&Cell, usize)> {
    let mut index: HashMap<CellKey, usize> = HashMap::new();
    let mut out: Vec<(&Cell, usize)> = Vec::new();
    for cell in cells {
        let Some(key) = cell.key() else { continue };
        match index.get(&key) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(key, out.len());
                out.push((cell, 1));
            }
        }
    }
    out
}

/// The `n` most frequent values, ties kept in order of first appearance.
pub fn top_values(cells: &[Cell], n: usize) -> Vec<ValueCount> {
    let mut freq = frequencies(cells);
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    freq.into_iter()
        .take(n)
        .map(|(cell, count)| ValueCount {
            value: cell.to_string(),
            count,
        })
        .collect()
}

/// Smallest of the most frequent values.
pub fn mode(cells: &[Cell]) -> Option<&Cell> {
    let freq = frequencies(cells);
    let best = freq.iter().map(|(_, c)| *c).max()?;
    freq.into_iter()
        .filter(|(_, c)| *c == best)
        .map(|(cell, _)| cell)
        .min_by(|a, b| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { Cell::Null } else { Cell::from(*v) })
            .collect()
    }

    #[test]
    fn test_frequencies_first_appearance_order() {
        let cells = cells(&["b", "a", "", "b", "c"]);
        let freq: Vec<(String, usize)> = frequencies(&cells)
            .into_iter()
            .map(|(c, n)| (c.to_string(), n))
            .collect();
        assert_eq!(
            freq,
            vec![("b".into(), 2), ("a".into(), 1), ("c".into(), 1)]
        );
    }

    #[test]
    fn test_top_values_stable_ties() {
        let top = top_values(&cells(&["x", "y", "z", "y"]), 2);
        assert_eq!(top[0].value, "y");
        assert_eq!(top[1].value, "x");
    }

    #[test]
    fn test_mode_picks_smallest_tie() {
        assert_eq!(mode(&cells(&["pear", "apple", "pear", "apple"])), Some(&Cell::from("apple")));
        let numbers = [Cell::from(3.0), Cell::from(1.0), Cell::Null];
        assert_eq!(mode(&numbers), Some(&Cell::Number(1.0)));
        assert_eq!(mode(&[Cell::Null]), None);
    }
}
