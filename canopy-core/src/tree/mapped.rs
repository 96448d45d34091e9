//! Pivot Buckets
//!
//! A leaf group keeps its filtered children bucketed by pivot key, one trie
//! level per pivot column. Interior entries map a key segment to the next
//! level; the last level holds the matching row ids.

use indexmap::IndexMap;

use super::node::RowNodeId;

/// Trie of row ids keyed by pivot-key segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenMapped {
    /// One more pivot level keyed by the segment value.
    Branch(IndexMap<String, ChildrenMapped>),
    /// Rows whose pivot values match the full path to this entry.
    Rows(Vec<RowNodeId>),
}

impl ChildrenMapped {
    /// Bucket `rows` into a trie `depth` levels deep.
    ///
    /// `key_of(row, level)` returns the key segment of `row` for the pivot
    /// column at `level`. Segment order follows first appearance.
    pub fn bucket<F>(rows: &[RowNodeId], depth: usize, key_of: &mut F) -> Self
    where
        F: FnMut(RowNodeId, usize) -> String,
    {
        Self::bucket_level(rows, 0, depth, key_of)
    }

    fn bucket_level<F>(rows: &[RowNodeId], level: usize, depth: usize, key_of: &mut F) -> Self
    where
        F: FnMut(RowNodeId, usize) -> String,
    {
        if level >= depth {
            return ChildrenMapped::Rows(rows.to_vec());
        }

        let mut groups: IndexMap<String, Vec<RowNodeId>> = IndexMap::new();
        for &row in rows {
            groups.entry(key_of(row, level)).or_default().push(row);
        }

        let branch = groups
            .into_iter()
            .map(|(key, members)| {
                let child = Self::bucket_level(&members, level + 1, depth, key_of);
                (key, child)
            })
            .collect();

        ChildrenMapped::Branch(branch)
    }

    /// Follow `keys` down the trie and return the rows found there.
    ///
    /// Returns `None` when a segment is missing or the path does not end on
    /// a row list.
    pub fn rows_at<S: AsRef<str>>(&self, keys: &[S]) -> Option<&[RowNodeId]> {
        let mut pointer = self;
        for key in keys {
            match pointer {
                ChildrenMapped::Branch(map) => pointer = map.get(key.as_ref())?,
                ChildrenMapped::Rows(_) => return None,
            }
        }
        match pointer {
            ChildrenMapped::Rows(rows) => Some(rows),
            ChildrenMapped::Branch(_) => None,
        }
    }

    /// Visit the key path of every row list in the trie.
    pub fn for_each_path<F>(&self, mut f: F)
    where
        F: FnMut(&[String]),
    {
        let mut path = Vec::new();
        self.walk(&mut path, &mut f);
    }

    fn walk<F>(&self, path: &mut Vec<String>, f: &mut F)
    where
        F: FnMut(&[String]),
    {
        match self {
            ChildrenMapped::Rows(_) => f(path),
            ChildrenMapped::Branch(map) => {
                for (key, child) in map {
                    path.push(key.clone());
                    child.walk(path, f);
                    path.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<RowNodeId> {
        raw.iter().copied().map(RowNodeId::from).collect()
    }

    // rows 0..4 keyed by (country, year)
    fn sample() -> ChildrenMapped {
        let keys = [
            ["uk", "2020"],
            ["uk", "2021"],
            ["us", "2020"],
            ["uk", "2020"],
        ];
        ChildrenMapped::bucket(&ids(&[0, 1, 2, 3]), 2, &mut |row, level| {
            keys[row.raw()][level].to_string()
        })
    }

    #[test]
    fn bucket_groups_rows_by_each_level() {
        let mapped = sample();
        assert_eq!(mapped.rows_at(&["uk", "2020"]), Some(&ids(&[0, 3])[..]));
        assert_eq!(mapped.rows_at(&["uk", "2021"]), Some(&ids(&[1])[..]));
        assert_eq!(mapped.rows_at(&["us", "2020"]), Some(&ids(&[2])[..]));
    }

    #[test]
    fn missing_or_partial_paths_yield_none() {
        let mapped = sample();
        assert_eq!(mapped.rows_at(&["us", "2021"]), None);
        assert_eq!(mapped.rows_at(&["uk"]), None);
        assert_eq!(mapped.rows_at(&["uk", "2020", "extra"]), None);
    }

    #[test]
    fn zero_depth_keeps_all_rows() {
        let mapped = ChildrenMapped::bucket(&ids(&[4, 5]), 0, &mut |_, _| unreachable!());
        let empty: [&str; 0] = [];
        assert_eq!(mapped.rows_at(&empty), Some(&ids(&[4, 5])[..]));
    }

    #[test]
    fn for_each_path_visits_leaves_in_insertion_order() {
        let mut paths = Vec::new();
        sample().for_each_path(|p| paths.push(p.join("/")));
        assert_eq!(paths, vec!["uk/2020", "uk/2021", "us/2020"]);
    }
}
