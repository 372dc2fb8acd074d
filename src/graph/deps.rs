//! Dependency edges between graph nodes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Error returned when a cycle would be created by adding a dependency.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("adding dependency {from:?} -> {to:?} would create a cycle")]
pub struct CycleError<K: fmt::Debug> {
    /// The key that would depend on another.
    pub from: K,
    /// The key that would be depended upon.
    pub to: K,
}

/// "A depends on B" edges over a fixed set of keys.
///
/// Keys are numbered in registration order; that order breaks ties when
/// sorting topologically, so evaluation order is deterministic.
#[derive(Clone, Debug)]
pub struct DependencyGraph<K> {
    keys: Vec<K>,
    index: HashMap<K, usize>,
    /// forward[i] -> nodes that `keys[i]` depends on
    forward: Vec<Vec<usize>>,
    /// reverse[i] -> nodes that depend on `keys[i]`
    reverse: Vec<Vec<usize>>,
}

impl<K> Default for DependencyGraph<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DependencyGraph<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
            forward: Vec::new(),
            reverse: Vec::new(),
        }
    }

    /// Registers `key` if unseen. Returns its registration index.
    pub fn add_node(&mut self, key: K) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.keys.len();
        self.keys.push(key);
        self.index.insert(key, i);
        self.forward.push(Vec::new());
        self.reverse.push(Vec::new());
        i
    }

    /// Adds a dependency: `from` depends on `to`. Unknown keys are
    /// registered first.
    ///
    /// Returns `Ok(true)` if the edge is new, `Ok(false)` if it already
    /// existed. A self-loop or any edge closing a cycle is rejected.
    pub fn add_dependency(&mut self, from: K, to: K) -> Result<bool, CycleError<K>> {
        let f = self.add_node(from);
        let t = self.add_node(to);

        if f == t || self.reaches(t, f) {
            return Err(CycleError { from, to });
        }

        if self.forward[f].contains(&t) {
            return Ok(false);
        }
        self.forward[f].push(t);
        self.reverse[t].push(f);
        Ok(true)
    }

    /// DFS along forward edges
    fn reaches(&self, start: usize, target: usize) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.forward[current].iter().copied());
            }
        }
        false
    }

    /// Direct dependencies of `key`, in the order they were added
    pub fn dependencies(&self, key: K) -> impl Iterator<Item = K> + '_ {
        self.index
            .get(&key)
            .into_iter()
            .flat_map(move |&i| self.forward[i].iter().map(move |&j| self.keys[j]))
    }

    /// Every node that depends on `key`, directly or not. Excludes `key`.
    pub fn transitive_dependents(&self, key: K) -> Vec<K> {
        let Some(&start) = self.index.get(&key) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            for &next in &self.reverse[current] {
                if seen.insert(next) {
                    out.push(self.keys[next]);
                    stack.push(next);
                }
            }
        }
        out
    }

    /// Sorts `subset` so that every node comes after its dependencies.
    /// Edges leaving the subset are ignored. Ties go to the node registered
    /// first. Unknown keys are dropped.
    pub fn topo_order(&self, subset: impl IntoIterator<Item = K>) -> Vec<K> {
        let members: HashSet<usize> = subset
            .into_iter()
            .filter_map(|k| self.index.get(&k).copied())
            .collect();

        let mut pending: HashMap<usize, usize> = members
            .iter()
            .map(|&i| (i, self.forward[i].iter().filter(|d| members.contains(d)).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .filter(|(_, &n)| n == 0)
            .map(|(&i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(self.keys[i]);
            for &dependent in &self.reverse[i] {
                if let Some(n) = pending.get_mut(&dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
        }
        order
    }

    /// `roots` plus all their transitive dependents, in evaluation order
    pub fn affected(&self, roots: impl IntoIterator<Item = K>) -> Vec<K> {
        let mut subset = Vec::new();
        for root in roots {
            subset.push(root);
            subset.extend(self.transitive_dependents(root));
        }
        self.topo_order(subset)
    }
}
