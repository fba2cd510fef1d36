//! Lineage tree assembly
//!
//! Turns the root-first lineages of a set of taxa into the minimal tree that
//! connects them. The tree is rooted at the most recent common ancestor (the
//! last element of the lineages' common prefix). Unless intermediate nodes are
//! requested, a node that was not asked for and has a single child is skipped,
//! so every inner node of the result is either requested or a branching point.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use taxo_common::TaxId;

use super::{SourceError, SourceResult};

/// Options for topology assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyOptions {
    /// Keep single-child lineage nodes that were not requested
    pub intermediate_nodes: bool,
}

/// One node of a topology returned by a data source (ids only, no names)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyNode {
    pub id: TaxId,
    pub children: Vec<TopologyNode>,
}

impl TopologyNode {
    pub fn leaf(id: TaxId) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    /// Every id in this subtree
    pub fn ids(&self) -> BTreeSet<TaxId> {
        let mut ids = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.insert(node.id);
            stack.extend(node.children.iter());
        }
        ids
    }

    /// Number of nodes in this subtree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TopologyNode::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Assemble the minimal connecting tree from root-first lineages
///
/// `lineages` maps every requested (and known) taxon to its lineage, which
/// must end with the taxon itself.
pub fn assemble(
    lineages: &HashMap<TaxId, Vec<TaxId>>,
    options: TopologyOptions,
) -> SourceResult<TopologyNode> {
    let ordered: BTreeMap<TaxId, &Vec<TaxId>> = lineages.iter().map(|(k, v)| (*k, v)).collect();

    let mut paths = ordered.iter();
    let Some((first_id, first)) = paths.next() else {
        return Err(SourceError::Inconsistent("no lineage to assemble".to_string()));
    };
    if first.last() != Some(first_id) {
        return Err(SourceError::Inconsistent(format!(
            "lineage of taxid {} does not end with itself",
            first_id
        )));
    }

    let mut prefix_len = first.len();
    for (id, lineage) in paths {
        if lineage.last() != Some(id) {
            return Err(SourceError::Inconsistent(format!(
                "lineage of taxid {} does not end with itself",
                id
            )));
        }
        prefix_len = first
            .iter()
            .zip(lineage.iter())
            .take(prefix_len)
            .take_while(|(a, b)| a == b)
            .count();
    }

    if prefix_len == 0 {
        return Err(SourceError::Inconsistent(
            "requested taxa share no common ancestor".to_string(),
        ));
    }
    let root = first[prefix_len - 1];

    let mut edges: BTreeMap<TaxId, BTreeSet<TaxId>> = BTreeMap::new();
    for lineage in ordered.values() {
        for pair in lineage[prefix_len - 1..].windows(2) {
            edges.entry(pair[0]).or_default().insert(pair[1]);
        }
    }

    let requested: BTreeSet<TaxId> = ordered.keys().copied().collect();
    let mut assembler = Assembler {
        edges: &edges,
        requested: &requested,
        keep_intermediate: options.intermediate_nodes,
        visited: BTreeSet::new(),
    };

    assembler.node(root)
}

struct Assembler<'a> {
    edges: &'a BTreeMap<TaxId, BTreeSet<TaxId>>,
    requested: &'a BTreeSet<TaxId>,
    keep_intermediate: bool,
    visited: BTreeSet<TaxId>,
}

impl Assembler<'_> {
    fn node(&mut self, id: TaxId) -> SourceResult<TopologyNode> {
        self.visit(id)?;

        let edges = self.edges;
        let mut children = Vec::new();
        for &child in edges.get(&id).into_iter().flatten() {
            let kept = self.skip_intermediate(child)?;
            children.push(self.node(kept)?);
        }

        Ok(TopologyNode { id, children })
    }

    /// Follow single-child chains down to the next node worth keeping
    fn skip_intermediate(&mut self, mut id: TaxId) -> SourceResult<TaxId> {
        if self.keep_intermediate {
            return Ok(id);
        }

        loop {
            if self.requested.contains(&id) {
                return Ok(id);
            }
            match self.edges.get(&id) {
                Some(children) if children.len() == 1 => {
                    self.visit(id)?;
                    match children.iter().next() {
                        Some(&only) => id = only,
                        None => return Ok(id),
                    }
                },
                _ => return Ok(id),
            }
        }
    }

    fn visit(&mut self, id: TaxId) -> SourceResult<()> {
        if self.visited.insert(id) {
            Ok(())
        } else {
            Err(SourceError::Inconsistent(format!(
                "taxid {} is reachable twice from the common ancestor",
                id
            )))
        }
    }
}
