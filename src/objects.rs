use num_traits::{PrimInt, Signed};
use std::{fmt, time::SystemTime, error::Error};

/// Dense index of a node in the engine's matrices. Assigned by ascending key order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

impl fmt::Display for NodeIdx {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Edge weights: any primitive signed integer.
pub trait Weight: PrimInt + Signed + fmt::Debug + fmt::Display + Send + Sync {}
impl<T: PrimInt + Signed + fmt::Debug + fmt::Display + Send + Sync> Weight for T {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge<W> {
	pub to: usize, // slot of the target vertex in the store, not a NodeIdx
	pub weight: W,
}

#[derive(Clone, Debug)]
pub struct Vertex<K, W> {
	pub id: K,
	pub edges: Vec<Edge<W>>,
}

impl<K, W> Vertex<K, W> {
	pub fn new(id: K) -> Self { Self { id, edges: vec![] } }
}

/// Outcome of a finished computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
	Consistent,
	NegativeCycle(NodeIdx),
}

pub struct TimeCheck(SystemTime);
impl TimeCheck {
	pub fn new() -> Self { TimeCheck(SystemTime::now()) }
	pub fn delta(&mut self) -> Result<f32, Box<dyn Error>> {
		let old_time = self.0;
		self.0 = SystemTime::now();
		Ok(self.0.duration_since(old_time)?.as_secs_f32())
	}
}

impl Default for TimeCheck {
	fn default() -> Self { Self::new() }
}
