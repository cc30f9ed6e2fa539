use crate::objects::{Edge, NodeIdx, Vertex, Weight};
use log::debug;
use std::collections::{btree_map::Entry, BTreeMap};

/// Directed weighted graph keyed by any ordered type.
///
/// Vertice live in a dense `Vec` in insertion order (their "slot"); edges point at slots.
/// The `BTreeMap` gives key lookup and ascending-key iteration.
#[derive(Clone, Debug)]
pub struct Graph<K, W> {
	slots: BTreeMap<K, usize>,
	vertice: Vec<Vertex<K, W>>,
}

impl<K: Ord + Clone, W: Weight> Graph<K, W> {
	pub fn new() -> Self { Self { slots: BTreeMap::new(), vertice: vec![] } }

	/// Batch construction: every triple adds both endpoints, then the edge.
	pub fn from_triples<I: IntoIterator<Item = (K, K, W)>>(triples: I) -> Self {
		let mut g = Self::new();
		for (from, to, weight) in triples {
			g.add_node(from.clone());
			g.add_node(to.clone());
			g.add_edge(&from, &to, weight);
		}
		debug!("graph built: {} vertice, {} edges", g.size(), g.num_edges());
		g
	}

	/// Returns false if the node was already there.
	pub fn add_node(&mut self, id: K) -> bool {
		match self.slots.entry(id) {
			Entry::Occupied(_) => false,
			Entry::Vacant(e) => {
				let slot = self.vertice.len();
				self.vertice.push(Vertex::new(e.key().clone()));
				e.insert(slot);
				true
			}
		}
	}

	/// Inserts or overwrites the edge `from -> to`. Both nodes must exist, otherwise nothing changes and false is returned.
	pub fn add_edge(&mut self, from: &K, to: &K, weight: W) -> bool {
		let (a, b) = match (self.slots.get(from), self.slots.get(to)) {
			(Some(a), Some(b)) => (*a, *b),
			_ => return false,
		};
		let edges = &mut self.vertice[a].edges;
		match edges.iter_mut().find(|e| e.to == b) {
			Some(e) => e.weight = weight,
			None => edges.push(Edge { to: b, weight }),
		}
		true
	}

	pub fn size(&self) -> usize { self.vertice.len() }
	pub fn num_edges(&self) -> usize { self.vertice.iter().map(|v| v.edges.len()).sum() }
	pub fn is_empty(&self) -> bool { self.vertice.is_empty() }
	pub fn contains(&self, k: &K) -> bool { self.slots.contains_key(k) }
	pub fn get(&self, k: &K) -> Option<&Vertex<K, W>> { self.slots.get(k).map(|s| &self.vertice[*s]) }
	pub fn key_of(&self, slot: usize) -> Option<&K> { self.vertice.get(slot).map(|v| &v.id) }

	pub fn get_edge(&self, from: &K, to: &K) -> Option<W> {
		let b = *self.slots.get(to)?;
		self.get(from)?.edges.iter().find(|e| e.to == b).map(|e| e.weight)
	}

	/// Vertice in ascending key order.
	pub fn iter(&self) -> impl Iterator<Item = &Vertex<K, W>> + '_ {
		self.slots.values().map(move |s| &self.vertice[*s])
	}

	/// Maps each slot to its dense index (position in ascending key order).
	pub fn dense_indices(&self) -> Vec<NodeIdx> {
		let mut idx = vec![NodeIdx(0); self.vertice.len()];
		for (i, slot) in self.slots.values().enumerate() {
			idx[*slot] = NodeIdx(i);
		}
		idx
	}
}

impl<K: Ord + Clone, W: Weight> Default for Graph<K, W> {
	fn default() -> Self { Self::new() }
}
