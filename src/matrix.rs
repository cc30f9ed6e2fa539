use crate::errors::RoutingError;
use rayon::prelude::*;

/// Dense row-major n x n matrix, cell (i, j) at `i * n + j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquareMatrix<T> {
	n: usize,
	data: Vec<T>,
}

impl<T: Clone> SquareMatrix<T> {
	/// Allocates without aborting: a failed allocation comes back as `RoutingError::Allocation`.
	pub fn try_filled(n: usize, value: T) -> Result<Self, RoutingError> {
		let len = n.checked_mul(n).ok_or_else(|| RoutingError::Allocation {
			msg: format!("{} x {} matrix is too large", n, n) })?;
		let mut data = Vec::new();
		data.try_reserve_exact(len).map_err(|e| RoutingError::Allocation {
			msg: format!("{} x {} matrix: {}", n, n, e) })?;
		data.resize(len, value);
		Ok(Self { n, data })
	}
}

impl<T> Default for SquareMatrix<T> {
	fn default() -> Self { Self { n: 0, data: vec![] } }
}

impl<T> SquareMatrix<T> {
	pub fn len(&self) -> usize { self.n }
	pub fn is_empty(&self) -> bool { self.n == 0 }
	pub fn get(&self, i: usize, j: usize) -> &T { &self.data[i * self.n + j] }
	pub fn set(&mut self, i: usize, j: usize, value: T) { self.data[i * self.n + j] = value; }
	pub fn row(&self, i: usize) -> &[T] { &self.data[i * self.n..(i + 1) * self.n] }
}

impl<T: Send> SquareMatrix<T> {
	pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksMut<'_, T> {
		self.data.par_chunks_mut(self.n.max(1))
	}
}
