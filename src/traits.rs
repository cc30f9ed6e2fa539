use crate::{
	errors::{ok_or_pe, RoutingError},
	objects::{NodeIdx, Status},
};

/// Read side of an all-pairs shortest path result.
pub trait AllPairs {
	type Key;
	type Weight;

	fn status(&self) -> Result<Status, RoutingError>;
	fn num_nodes(&self) -> usize;
	fn node(&self, idx: NodeIdx) -> Option<&Self::Key>;
	fn index_of(&self, key: &Self::Key) -> Option<NodeIdx>;
	/// `Ok(None)` means there is no path.
	fn distance(&self, source: NodeIdx, target: NodeIdx) -> Result<Option<Self::Weight>, RoutingError>;
	/// Nodes from source to target, both included.
	fn path(&self, source: NodeIdx, target: NodeIdx) -> Result<Option<Vec<NodeIdx>>, RoutingError>;

	fn path_keys(&self, source: NodeIdx, target: NodeIdx) -> Result<Option<Vec<&Self::Key>>, RoutingError> {
		match self.path(source, target)? {
			None => Ok(None),
			Some(p) => p.into_iter()
				.map(|i| ok_or_pe(self.node(i), "path node is not in the graph"))
				.collect::<Result<Vec<_>, _>>()
				.map(Some),
		}
	}
}
