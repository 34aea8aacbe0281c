#![forbid(unsafe_code)]

use crate::ROOT_VERSION_ID;
use crate::model::VersionSuccessor;
use std::collections::{BTreeMap, BTreeSet};

/// The in-memory view of one item's version history: the successor edges
/// recorded against the item, a child-to-parents map, and the derived leaf
/// set (version ids that never appear as the source of an edge).
///
/// Acyclicity holds because edges are only ever added from an existing
/// member of the DAG toward a freshly generated version id.
#[derive(Clone, Debug)]
pub struct VersionHistoryDag {
    item_id: i64,
    edge_ids: Vec<i64>,
    parents: BTreeMap<i64, BTreeSet<i64>>,
    from_ids: BTreeSet<i64>,
    to_ids: BTreeSet<i64>,
}

impl VersionHistoryDag {
    pub fn new(item_id: i64, edges: Vec<VersionSuccessor>) -> Self {
        let mut dag = Self {
            item_id,
            edge_ids: Vec::new(),
            parents: BTreeMap::new(),
            from_ids: BTreeSet::new(),
            to_ids: BTreeSet::new(),
        };
        for edge in edges {
            dag.add_edge(edge.from_id, edge.to_id, edge.id);
        }
        dag
    }

    pub fn item_id(&self) -> i64 {
        self.item_id
    }

    pub fn edge_ids(&self) -> &[i64] {
        &self.edge_ids
    }

    pub fn is_empty(&self) -> bool {
        self.edge_ids.is_empty()
    }

    pub fn check_item_in_dag(&self, id: i64) -> bool {
        self.from_ids.contains(&id) || self.to_ids.contains(&id)
    }

    /// Record an edge from `parent_id` to `child_id`. The parent stops being
    /// a leaf, the child becomes one unless it already has outgoing edges.
    pub fn add_edge(&mut self, parent_id: i64, child_id: i64, successor_id: i64) {
        self.edge_ids.push(successor_id);
        self.parents.entry(child_id).or_default().insert(parent_id);
        self.from_ids.insert(parent_id);
        self.to_ids.insert(child_id);
    }

    /// Version ids with no outgoing edge, in ascending order.
    pub fn leaves(&self) -> Vec<i64> {
        self.to_ids.difference(&self.from_ids).copied().collect()
    }

    /// Parents of `id` recorded in this DAG, including the root sentinel for
    /// versions attached directly under the root. Empty for unknown ids.
    pub fn parents_of(&self, id: i64) -> Vec<i64> {
        match self.parents.get(&id) {
            Some(parents) => parents.iter().copied().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: i64, from_id: i64, to_id: i64) -> VersionSuccessor {
        VersionSuccessor { id, from_id, to_id }
    }

    #[test]
    fn empty_dag_has_no_leaves() {
        let dag = VersionHistoryDag::new(7, Vec::new());

        assert!(dag.is_empty());
        assert!(dag.leaves().is_empty());
        assert!(!dag.check_item_in_dag(1));
    }

    #[test]
    fn leaves_are_versions_with_no_outgoing_edge() {
        let dag = VersionHistoryDag::new(
            7,
            vec![
                edge(100, ROOT_VERSION_ID, 1),
                edge(101, 1, 2),
                edge(102, 1, 3),
            ],
        );

        assert_eq!(dag.leaves(), vec![2, 3]);
        assert_eq!(dag.edge_ids(), &[100, 101, 102]);
    }

    #[test]
    fn adding_an_edge_drops_the_parent_from_the_leaves() {
        let mut dag = VersionHistoryDag::new(7, vec![edge(100, ROOT_VERSION_ID, 1)]);
        assert_eq!(dag.leaves(), vec![1]);

        dag.add_edge(1, 2, 101);

        assert_eq!(dag.leaves(), vec![2]);
        assert!(dag.check_item_in_dag(1));
        assert!(dag.check_item_in_dag(2));
    }

    #[test]
    fn merge_child_collapses_both_parents_into_one_leaf() {
        let mut dag = VersionHistoryDag::new(
            7,
            vec![edge(100, ROOT_VERSION_ID, 1), edge(101, ROOT_VERSION_ID, 2)],
        );
        assert_eq!(dag.leaves(), vec![1, 2]);

        dag.add_edge(1, 3, 102);
        dag.add_edge(2, 3, 103);

        assert_eq!(dag.leaves(), vec![3]);
        assert_eq!(dag.parents_of(3), vec![1, 2]);
    }

    #[test]
    fn parents_of_root_children_include_the_sentinel() {
        let dag = VersionHistoryDag::new(7, vec![edge(100, ROOT_VERSION_ID, 1)]);

        assert_eq!(dag.parents_of(1), vec![ROOT_VERSION_ID]);
        assert_eq!(dag.parents_of(42), Vec::<i64>::new());
    }
}
