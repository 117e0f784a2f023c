use std::collections::HashMap;

/// A compiled select-link query: an OR of AND-sets over compact link
/// ids. A route satisfies the query when it contains every link of at
/// least one AND-set.
///
/// Matching counts down the remaining size of each AND-set as the
/// route's links are scanned (routes are simple, so a link is seen at
/// most once) and short-circuits as soon as any counter reaches zero.
#[derive(Debug, Clone)]
pub struct SelectLinkQuery {
    and_sets: Vec<Vec<u32>>,
    membership: HashMap<u32, Vec<usize>>,
}

impl SelectLinkQuery {
    pub fn new(mut and_sets: Vec<Vec<u32>>) -> Self {
        for set in &mut and_sets {
            set.sort_unstable();
            set.dedup();
        }
        let mut membership: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, set) in and_sets.iter().enumerate() {
            for &link in set {
                membership.entry(link).or_default().push(index);
            }
        }
        Self {
            and_sets,
            membership,
        }
    }

    pub fn n_sets(&self) -> usize {
        self.and_sets.len()
    }

    pub fn and_sets(&self) -> &[Vec<u32>] {
        &self.and_sets
    }

    /// largest link id referenced by the query, for validation.
    pub fn max_link(&self) -> Option<u32> {
        self.and_sets.iter().flatten().copied().max()
    }

    /// `counts` is caller scratch, resized and refilled on every call.
    pub fn matches(&self, route: &[u32], counts: &mut Vec<usize>) -> bool {
        counts.clear();
        counts.extend(self.and_sets.iter().map(|set| set.len()));
        // an empty AND-set is trivially satisfied
        if counts.iter().any(|&count| count == 0) {
            return true;
        }
        for link in route {
            if let Some(sets) = self.membership.get(link) {
                for &index in sets {
                    counts[index] -= 1;
                    if counts[index] == 0 {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_link_query() {
        let query = SelectLinkQuery::new(vec![vec![0]]);
        let mut counts = Vec::new();
        assert!(query.matches(&[0, 1], &mut counts));
        assert!(!query.matches(&[2], &mut counts));
    }

    #[test]
    fn test_and_semantics() {
        let query = SelectLinkQuery::new(vec![vec![0, 3]]);
        let mut counts = Vec::new();
        assert!(!query.matches(&[0, 1], &mut counts));
        assert!(!query.matches(&[3], &mut counts));
        assert!(query.matches(&[0, 2, 3], &mut counts));
    }

    #[test]
    fn test_or_of_and_sets() {
        let query = SelectLinkQuery::new(vec![vec![0, 1], vec![5]]);
        let mut counts = Vec::new();
        assert!(query.matches(&[5, 9], &mut counts));
        assert!(query.matches(&[1, 0], &mut counts));
        assert!(!query.matches(&[0, 9], &mut counts));
    }

    #[test]
    fn test_duplicate_links_in_set_deduped() {
        let query = SelectLinkQuery::new(vec![vec![2, 2]]);
        let mut counts = Vec::new();
        assert!(query.matches(&[2], &mut counts));
    }

    #[test]
    fn test_empty_and_set_matches_everything() {
        let query = SelectLinkQuery::new(vec![vec![]]);
        let mut counts = Vec::new();
        assert!(query.matches(&[7], &mut counts));
        assert!(query.matches(&[], &mut counts));
    }

    #[test]
    fn test_scratch_reuse() {
        let query = SelectLinkQuery::new(vec![vec![0, 1]]);
        let mut counts = Vec::new();
        assert!(query.matches(&[0, 1], &mut counts));
        assert!(!query.matches(&[0], &mut counts));
        assert!(query.matches(&[1, 0], &mut counts));
    }
}
