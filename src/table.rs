//! Table-valued operations over plain `Vec<T>` tables.
//!
//! These mirror the dataframe verbs the pipeline needs: drop duplicates,
//! left-outer join and group-by with count/sum.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// Keeps the first row for every key, in input order.
///
/// Returns the surviving rows and how many were dropped.
pub fn dedup_by_key<T, K, F>(rows: Vec<T>, key: F) -> (Vec<T>, usize)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let before = rows.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<T> = rows.into_iter().filter(|row| seen.insert(key(row))).collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Left-outer join of `left` against `right`.
///
/// Every left row appears at least once. A left row whose key matches several
/// right rows is repeated once per match, in right-table order. A `None` key
/// on either side never matches.
pub fn left_join<'r, L, R, K, FL, FR>(
    left: Vec<L>,
    right: &'r [R],
    left_key: FL,
    right_key: FR,
) -> Vec<(L, Option<&'r R>)>
where
    L: Clone,
    K: Eq + Hash,
    FL: Fn(&L) -> Option<K>,
    FR: Fn(&R) -> Option<K>,
{
    let mut index: HashMap<K, Vec<&'r R>> = HashMap::new();
    for row in right {
        if let Some(key) = right_key(row) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut joined = Vec::with_capacity(left.len());
    for row in left {
        let matches = left_key(&row).and_then(|key| index.get(&key));
        match matches.map(Vec::as_slice) {
            None | Some([]) => joined.push((row, None)),
            Some([only]) => joined.push((row, Some(*only))),
            Some([rest @ .., last]) => {
                for m in rest {
                    joined.push((row.clone(), Some(*m)));
                }
                joined.push((row, Some(*last)));
            }
        }
    }
    joined
}

/// Row count and amount total for one group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupTotals {
    pub count: i64,
    pub sum: i64,
}

/// Groups rows by `key`, counting rows and summing `amount` per group.
///
/// Missing amounts contribute zero to the sum but the row is still counted.
/// Sums saturate at the `i64` bounds. Groups come back ordered by key.
pub fn group_aggregate<T, K, FK, FA>(rows: &[T], key: FK, amount: FA) -> BTreeMap<K, GroupTotals>
where
    K: Ord,
    FK: Fn(&T) -> K,
    FA: Fn(&T) -> Option<i64>,
{
    let mut groups: BTreeMap<K, GroupTotals> = BTreeMap::new();
    for row in rows {
        let totals = groups.entry(key(row)).or_default();
        totals.count += 1;
        totals.sum = totals.sum.saturating_add(amount(row).unwrap_or(0));
    }
    groups
}

/// Counts the keys that occur more than once.
pub fn duplicated_keys<T, K, F>(rows: &[T], key: F) -> usize
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let mut counts: HashMap<K, usize> = HashMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            *counts.entry(k).or_default() += 1;
        }
    }
    counts.values().filter(|&&n| n > 1).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Option<&'static str>,
        group: &'static str,
        amount: Option<i64>,
    }

    fn row(id: &'static str, group: &'static str, amount: i64) -> Row {
        Row {
            id: Some(id),
            group,
            amount: Some(amount),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let rows = vec![row("a", "x", 1), row("b", "x", 2), row("a", "y", 3)];
        let (kept, removed) = dedup_by_key(rows, |r| r.id);

        assert_eq!(removed, 1);
        assert_eq!(kept, vec![row("a", "x", 1), row("b", "x", 2)]);
    }

    #[test]
    fn test_dedup_treats_missing_keys_as_equal() {
        let mut first = row("", "x", 1);
        first.id = None;
        let mut second = row("", "y", 2);
        second.id = None;

        let (kept, removed) = dedup_by_key(vec![first.clone(), second], |r| r.id);
        assert_eq!(removed, 1);
        assert_eq!(kept, vec![first]);
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let left = vec![row("a", "x", 1), row("b", "z", 2)];
        let right = vec![("x", "X-name")];

        let joined = left_join(left, &right, |l| Some(l.group), |r| Some(r.0));

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].1, Some(&("x", "X-name")));
        assert_eq!(joined[1].1, None);
    }

    #[test]
    fn test_left_join_fans_out_on_duplicate_right_keys() {
        let left = vec![row("a", "x", 1)];
        let right = vec![("x", "first"), ("y", "other"), ("x", "second")];

        let joined = left_join(left, &right, |l| Some(l.group), |r| Some(r.0));

        let names: Vec<_> = joined.iter().map(|(_, r)| r.map(|r| r.1)).collect();
        assert_eq!(names, vec![Some("first"), Some("second")]);
        assert!(joined.iter().all(|(l, _)| l.id == Some("a")));
    }

    #[test]
    fn test_left_join_null_keys_never_match() {
        let left = vec![row("a", "x", 1)];
        let right: Vec<(Option<&str>, &str)> = vec![(None, "orphan")];

        let joined = left_join(left, &right, |_| None::<&str>, |r| r.0);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].1, None);
    }

    #[test]
    fn test_group_aggregate_counts_and_sums() {
        let mut missing = row("d", "x", 0);
        missing.amount = None;
        let rows = vec![row("a", "x", 3500), row("b", "y", 2000), row("c", "x", 1500), missing];

        let groups = group_aggregate(&rows, |r| r.group, |r| r.amount);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["x"], GroupTotals { count: 3, sum: 5000 });
        assert_eq!(groups["y"], GroupTotals { count: 1, sum: 2000 });
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_group_aggregate_saturates_instead_of_overflowing() {
        let near_max = i64::MAX - 807;
        let rows = vec![
            row("a", "x", near_max),
            row("b", "x", near_max),
            row("c", "y", i64::MIN),
            row("d", "y", -1),
        ];

        let groups = group_aggregate(&rows, |r| r.group, |r| r.amount);

        assert_eq!(groups["x"], GroupTotals { count: 2, sum: i64::MAX });
        assert_eq!(groups["y"], GroupTotals { count: 2, sum: i64::MIN });
    }

    #[test]
    fn test_duplicated_keys() {
        let rows = vec![row("a", "x", 1), row("a", "y", 1), row("b", "x", 1), row("c", "x", 1)];
        assert_eq!(duplicated_keys(&rows, |r| r.id), 1);
    }
}
