use crate::{
	errors::{ok_or_oor, RoutingError},
	graph::Graph,
	matrix::SquareMatrix,
	objects::{NodeIdx, Status, Weight},
	traits::AllPairs,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::ops::ControlFlow;

/// All-pairs shortest paths over a [`Graph`] snapshot.
///
/// `dist` holds `None` for "no path"; `via` holds the intermediate node a pair was last improved through.
/// Queries fail with `NotComputed` until `compute` has finished, and with `NegativeCycle` if one was found.
#[derive(Clone, Debug)]
pub struct FloydWarshall<K, W> {
	nodes: Vec<K>,
	dist: SquareMatrix<Option<W>>,
	via: SquareMatrix<Option<NodeIdx>>,
	status: Option<Status>,
}

impl<K: Ord + Clone, W: Weight> FloydWarshall<K, W> {
	pub fn new() -> Self {
		Self { nodes: vec![], dist: SquareMatrix::default(), via: SquareMatrix::default(), status: None }
	}

	pub fn compute(&mut self, graph: &Graph<K, W>) -> Result<Status, RoutingError> {
		self.compute_with(graph, false, |_, _| ControlFlow::Continue(()))
	}

	/// `observer` gets `(stages done, total stages)` after every `k` stage; breaking cancels.
	/// With `parallel`, rows of a stage are relaxed on the rayon pool against a copy of row `k`.
	/// Without a negative cycle both ways give the same matrices; with one, the parallel run
	/// may report the cycle at a different node.
	pub fn compute_with<F>(&mut self, graph: &Graph<K, W>, parallel: bool, mut observer: F) -> Result<Status, RoutingError>
	where F: FnMut(usize, usize) -> ControlFlow<()> {
		// drop the previous result first, so both generations are never held at once
		*self = Self::new();

		let n = graph.size();
		let mut dist = SquareMatrix::try_filled(n, None)?;
		let mut via = SquareMatrix::try_filled(n, None)?;
		let nodes: Vec<K> = graph.iter().map(|v| v.id.clone()).collect();
		info!("floyd-warshall: {} nodes, {} edges, parallel: {}", n, graph.num_edges(), parallel);

		for i in 0..n {
			dist.set(i, i, Some(W::zero()));
		}
		let dense = graph.dense_indices();
		for (i, v) in graph.iter().enumerate() {
			for e in v.edges.iter() {
				let j = dense[e.to].0;
				// a self-loop can only lower the diagonal
				if i == j && e.weight >= W::zero() { continue; }
				dist.set(i, j, Some(e.weight));
			}
		}

		for k in 0..n {
			let relaxed = if parallel {
				// stage k leaves row k alone unless D[k][k] < 0, so rows can work off a copy of it
				let row_k = dist.row(k).to_vec();
				dist.par_rows_mut().zip(via.par_rows_mut()).enumerate()
					.try_for_each(|(i, (d, v))| relax_row(k, &row_k, d, v).map_err(|j| (i, j)))
			} else {
				relax_in_place(k, &mut dist, &mut via)
			};
			if let Err((i, j)) = relaxed {
				// a negative cycle keeps doubling its cost until it leaves the weight range
				if let Some(c) = first_negative_diagonal(&dist) {
					warn!("negative-weight cycle at node index {}, relaxation stopped at stage {} by overflow", c, k);
					let status = Status::NegativeCycle(NodeIdx(c));
					*self = Self { nodes, dist, via, status: Some(status) };
					return Ok(status);
				}
				warn!("cost from node index {} to {} overflows at stage {}", i, j, k);
				return Err(RoutingError::Overflow { source: i, target: j });
			}
			if observer(k + 1, n).is_break() {
				warn!("cancelled after stage {} of {}", k + 1, n);
				return Err(RoutingError::Cancelled);
			}
		}

		let status = match first_negative_diagonal(&dist) {
			Some(i) => {
				warn!("negative-weight cycle at node index {}", i);
				Status::NegativeCycle(NodeIdx(i))
			},
			None => Status::Consistent,
		};
		*self = Self { nodes, dist, via, status: Some(status) };
		Ok(status)
	}

	fn ready(&self) -> Result<(), RoutingError> {
		match self.status {
			None => Err(RoutingError::NotComputed),
			Some(Status::NegativeCycle(i)) => Err(RoutingError::NegativeCycle { node: i.0 }),
			Some(Status::Consistent) => Ok(()),
		}
	}

	fn checked(&self, idx: NodeIdx) -> Result<usize, RoutingError> {
		let n = self.nodes.len();
		ok_or_oor((idx.0 < n).then_some(idx.0), idx.0, n)
	}
}

fn first_negative_diagonal<W: Weight>(dist: &SquareMatrix<Option<W>>) -> Option<usize> {
	(0..dist.len()).find(|i| matches!(dist.get(*i, *i), Some(d) if *d < W::zero()))
}

/// One stage over the whole matrix, D[i][k] and D[k][j] read as they are at that moment.
/// `Err((i, j))` if D[i][k] + D[k][j] doesn't fit into `W`.
fn relax_in_place<W: Weight>(k: usize, dist: &mut SquareMatrix<Option<W>>, via: &mut SquareMatrix<Option<NodeIdx>>) -> Result<(), (usize, usize)> {
	let n = dist.len();
	for i in 0..n {
		for j in 0..n {
			let (d_ik, d_kj) = match (*dist.get(i, k), *dist.get(k, j)) {
				(Some(a), Some(b)) => (a, b),
				_ => continue,
			};
			let through = d_ik.checked_add(&d_kj).ok_or((i, j))?;
			if dist.get(i, j).map_or(true, |d_ij| through < d_ij) {
				dist.set(i, j, Some(through));
				via.set(i, j, Some(NodeIdx(k)));
			}
		}
	}
	Ok(())
}

/// Row i of stage k against a copy of row k. `Err(j)` on overflow.
fn relax_row<W: Weight>(k: usize, row_k: &[Option<W>], d_row: &mut [Option<W>], v_row: &mut [Option<NodeIdx>]) -> Result<(), usize> {
	let d_ik = match d_row[k] {
		Some(w) => w,
		None => return Ok(()),
	};
	for (j, d_kj) in row_k.iter().enumerate() {
		let d_kj = match d_kj {
			Some(w) => *w,
			None => continue,
		};
		let through = d_ik.checked_add(&d_kj).ok_or(j)?;
		if d_row[j].map_or(true, |d_ij| through < d_ij) {
			d_row[j] = Some(through);
			v_row[j] = Some(NodeIdx(k));
		}
	}
	Ok(())
}

impl<K: Ord + Clone, W: Weight> Default for FloydWarshall<K, W> {
	fn default() -> Self { Self::new() }
}

impl<K: Ord + Clone, W: Weight> AllPairs for FloydWarshall<K, W> {
	type Key = K;
	type Weight = W;

	fn status(&self) -> Result<Status, RoutingError> {
		self.status.ok_or(RoutingError::NotComputed)
	}

	fn num_nodes(&self) -> usize { self.nodes.len() }
	fn node(&self, idx: NodeIdx) -> Option<&K> { self.nodes.get(idx.0) }
	fn index_of(&self, key: &K) -> Option<NodeIdx> { self.nodes.binary_search(key).ok().map(NodeIdx) }

	fn distance(&self, source: NodeIdx, target: NodeIdx) -> Result<Option<W>, RoutingError> {
		self.ready()?;
		let (i, j) = (self.checked(source)?, self.checked(target)?);
		Ok(*self.dist.get(i, j))
	}

	fn path(&self, source: NodeIdx, target: NodeIdx) -> Result<Option<Vec<NodeIdx>>, RoutingError> {
		if self.distance(source, target)?.is_none() {
			return Ok(None);
		}
		if source == target {
			return Ok(Some(vec![source]));
		}

		// expand (a, b) into (a, via) + (via, b) until segments are direct edges
		let n = self.nodes.len();
		let mut nodes = vec![];
		let mut stack = vec![(source.0, target.0)];
		let mut steps = 0;
		while let Some((a, b)) = stack.pop() {
			steps += 1;
			if steps > 2 * n * n {
				return Err(RoutingError::Programming { msg: format!("via matrix loops between {} and {}", source, target) });
			}
			match self.via.get(a, b) {
				None => nodes.push(NodeIdx(a)),
				Some(k) => {
					stack.push((k.0, b));
					stack.push((a, k.0));
				}
			}
		}
		nodes.push(target);
		debug!("path {} -> {}: {} nodes", source, target, nodes.len());
		Ok(Some(nodes))
	}
}

#[cfg(test)]
mod floyd_warshall_tests {
	use super::*;
	use crate::graph::graph_tests::three_nodes;
	use rand::{rngs::StdRng, Rng, SeedableRng};
	use test_case::test_case;

	fn computed<K: Ord + Clone, W: Weight>(g: &Graph<K, W>) -> FloydWarshall<K, W> {
		let mut fw = FloydWarshall::new();
		fw.compute(g).unwrap();
		fw
	}

	fn path_weight(g: &Graph<i64, i64>, fw: &FloydWarshall<i64, i64>, path: &[NodeIdx]) -> i64 {
		path.windows(2).map(|p| {
			let (a, b) = (fw.node(p[0]).unwrap(), fw.node(p[1]).unwrap());
			g.get_edge(a, b).expect("consecutive path nodes must be joined by an edge")
		}).sum()
	}

	// edges only go from smaller to bigger keys, so negative weights never form a cycle
	fn random_graph(seed: u64, n: i64, edges: usize, min_weight: i64) -> Graph<i64, i64> {
		let mut rng = StdRng::seed_from_u64(seed);
		let mut g = Graph::new();
		for v in 0..n {
			g.add_node(v);
		}
		for _ in 0..edges {
			let a = rng.gen_range(0..n);
			let b = rng.gen_range(0..n);
			let w = rng.gen_range(min_weight..20);
			if min_weight < 0 && a >= b { continue; }
			g.add_edge(&a, &b, w);
		}
		g
	}

	#[test_case(0, 1 => Some(1))]
	#[test_case(0, 2 => Some(3))]
	#[test_case(1, 2 => Some(2))]
	#[test_case(2, 0 => None)]
	#[test_case(1, 1 => Some(0))]
	fn three_nodes_distances(i: usize, j: usize) -> Option<i64> {
		computed(&three_nodes()).distance(NodeIdx(i), NodeIdx(j)).unwrap()
	}

	#[test]
	fn three_nodes_path() {
		let fw = computed(&three_nodes());
		assert_eq!(fw.status(), Ok(Status::Consistent));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(2)).unwrap(), Some(vec![NodeIdx(0), NodeIdx(1), NodeIdx(2)]));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(1)).unwrap(), Some(vec![NodeIdx(0), NodeIdx(1)]));
		assert_eq!(fw.path(NodeIdx(2), NodeIdx(2)).unwrap(), Some(vec![NodeIdx(2)]));
		assert_eq!(fw.path(NodeIdx(2), NodeIdx(0)).unwrap(), None);
	}

	#[test]
	fn calc_weights() {
		// 0 -> 1 -- 3
		// |         |
		// 4 -> 5 -> 6
		//      |    |
		//      7 -> 8
		let g: Graph<i64, i64> = Graph::from_triples(vec![
			(0, 1, 6), (0, 4, 1), (4, 5, 1), (5, 7, 1), (7, 8, 1),
			(8, 6, 1), (6, 3, 1), (3, 1, 1), (1, 3, 1), (5, 6, 4),
		]);
		let fw = computed(&g);
		let d = |a: i64, b: i64| fw.distance(fw.index_of(&a).unwrap(), fw.index_of(&b).unwrap()).unwrap();
		assert_eq!(d(0, 3), Some(6));
		assert_eq!(d(5, 3), Some(4));
		assert_eq!(d(1, 1), Some(0));
		assert_eq!(d(6, 5), None);
		assert_eq!(d(8, 0), None);

		let (src, dst) = (fw.index_of(&0).unwrap(), fw.index_of(&3).unwrap());
		assert_eq!(dst, NodeIdx(2));
		let keys: Vec<i64> = fw.path_keys(src, dst).unwrap().unwrap().into_iter().copied().collect();
		assert_eq!(keys, vec![0, 4, 5, 7, 8, 6, 3]);
	}

	#[test]
	fn disconnected_pair_is_unreachable() {
		let mut g: Graph<i64, i64> = Graph::new();
		g.add_node(0);
		g.add_node(1);
		let fw = computed(&g);
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(1)), Ok(None));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(1)), Ok(None));
		assert_eq!(fw.path_keys(NodeIdx(1), NodeIdx(0)), Ok(None));
	}

	#[test]
	fn negative_self_loop() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 0, -5)]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Ok(Status::NegativeCycle(NodeIdx(0))));
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(0)), Err(RoutingError::NegativeCycle { node: 0 }));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(0)), Err(RoutingError::NegativeCycle { node: 0 }));
	}

	#[test]
	fn positive_self_loop_keeps_zero_diagonal() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 0, 4), (0, 1, 2)]);
		let fw = computed(&g);
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(0)), Ok(Some(0)));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(0)), Ok(Some(vec![NodeIdx(0)])));
	}

	#[test]
	fn negative_cycle_between_nodes() {
		// reported at the lowest index whose diagonal went negative
		let g: Graph<i64, i64> = Graph::from_triples(vec![(3, 1, 2), (1, 2, 1), (2, 1, -4)]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Ok(Status::NegativeCycle(NodeIdx(0))));
		assert_eq!(fw.node(NodeIdx(0)), Some(&1));
		assert!(fw.distance(NodeIdx(2), NodeIdx(1)).is_err());
	}

	#[test]
	fn negative_edges_without_cycle() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 1, 4), (0, 2, 5), (2, 1, -3), (1, 3, 1)]);
		let fw = computed(&g);
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(1)), Ok(Some(2)));
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(3)), Ok(Some(3)));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(3)).unwrap(), Some(vec![NodeIdx(0), NodeIdx(2), NodeIdx(1), NodeIdx(3)]));
	}

	#[test]
	fn zero_weight_cycle() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 1, 0), (1, 0, 0), (1, 2, 1)]);
		let fw = computed(&g);
		assert_eq!(fw.status(), Ok(Status::Consistent));
		let p = fw.path(NodeIdx(0), NodeIdx(2)).unwrap().unwrap();
		assert_eq!(p, vec![NodeIdx(0), NodeIdx(1), NodeIdx(2)]);
		assert_eq!(path_weight(&g, &fw, &p), 1);
	}

	#[test]
	fn empty_graph() {
		let g: Graph<i64, i64> = Graph::new();
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Ok(Status::Consistent));
		assert_eq!(fw.num_nodes(), 0);
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(0)), Err(RoutingError::OutOfRange { index: 0, len: 0 }));
	}

	#[test]
	fn duplicate_edge_last_wins() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 1, 5), (0, 1, 3)]);
		assert_eq!(computed(&g).distance(NodeIdx(0), NodeIdx(1)), Ok(Some(3)));
	}

	#[test]
	fn queries_before_compute() {
		let fw: FloydWarshall<i64, i64> = FloydWarshall::new();
		assert_eq!(fw.status(), Err(RoutingError::NotComputed));
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(1)), Err(RoutingError::NotComputed));
		assert_eq!(fw.path(NodeIdx(0), NodeIdx(1)), Err(RoutingError::NotComputed));
	}

	#[test]
	fn out_of_range() {
		let fw = computed(&three_nodes());
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(3)), Err(RoutingError::OutOfRange { index: 3, len: 3 }));
		assert_eq!(fw.path(NodeIdx(9), NodeIdx(0)), Err(RoutingError::OutOfRange { index: 9, len: 3 }));
	}

	#[test]
	fn string_keys_are_indexed_ascending() {
		let g: Graph<String, i32> = Graph::from_triples(vec![
			("b".to_string(), "a".to_string(), 2),
			("c".to_string(), "b".to_string(), 1),
		]);
		let fw = computed(&g);
		assert_eq!(fw.index_of(&"a".to_string()), Some(NodeIdx(0)));
		assert_eq!(fw.index_of(&"c".to_string()), Some(NodeIdx(2)));
		assert_eq!(fw.index_of(&"z".to_string()), None);
		assert_eq!(fw.distance(NodeIdx(2), NodeIdx(0)), Ok(Some(3)));
		let keys: Vec<&str> = fw.path_keys(NodeIdx(2), NodeIdx(0)).unwrap().unwrap().into_iter().map(|s| s.as_str()).collect();
		assert_eq!(keys, vec!["c", "b", "a"]);
	}

	#[test]
	fn overflow_is_an_error() {
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 1, i64::MAX), (1, 2, 1)]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Err(RoutingError::Overflow { source: 0, target: 2 }));
		assert_eq!(fw.status(), Err(RoutingError::NotComputed));
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(2)), Err(RoutingError::NotComputed));

		let res = fw.compute_with(&g, true, |_, _| ControlFlow::Continue(()));
		assert_eq!(res, Err(RoutingError::Overflow { source: 0, target: 2 }));
	}

	#[test]
	fn small_weight_type_overflows() {
		let g: Graph<i64, i8> = Graph::from_triples(vec![(0, 1, 100), (1, 2, 100), (0, 2, 120)]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Err(RoutingError::Overflow { source: 0, target: 2 }));
	}

	#[test]
	fn overflowing_negative_cycle_is_a_cycle() {
		let w = -(1i64 << 62);
		let g: Graph<i64, i64> = Graph::from_triples(vec![(0, 1, w), (1, 0, w)]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Ok(Status::NegativeCycle(NodeIdx(0))));
		assert_eq!(fw.distance(NodeIdx(0), NodeIdx(1)), Err(RoutingError::NegativeCycle { node: 0 }));
	}

	#[test]
	fn negative_cycle_node_follows_in_place_order() {
		// with a copy of row k per stage the first negative diagonal would be node 2
		let g: Graph<i64, i64> = Graph::from_triples(vec![
			(3, 2, -1), (3, 0, 3), (2, 2, -1), (2, 3, 1), (2, 1, 3), (0, 0, 2), (0, 2, -4),
		]);
		let mut fw = FloydWarshall::new();
		assert_eq!(fw.compute(&g), Ok(Status::NegativeCycle(NodeIdx(0))));
		assert!(matches!(
			fw.compute_with(&g, true, |_, _| ControlFlow::Continue(())),
			Ok(Status::NegativeCycle(_))
		));
	}

	#[test]
	fn cancellation() {
		let g = random_graph(7, 10, 30, 1);
		let mut fw = FloydWarshall::new();
		let mut seen = vec![];
		let res = fw.compute_with(&g, false, |done, total| {
			seen.push((done, total));
			if done == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
		});
		assert_eq!(res, Err(RoutingError::Cancelled));
		assert_eq!(seen, vec![(1, 10), (2, 10), (3, 10)]);
		assert_eq!(fw.status(), Err(RoutingError::NotComputed));

		// a later full run works
		assert_eq!(fw.compute(&g), Ok(Status::Consistent));
	}

	#[test]
	fn compute_is_idempotent() {
		let g = random_graph(11, 25, 120, 1);
		let mut fw = FloydWarshall::new();
		fw.compute(&g).unwrap();
		let (dist, via) = (fw.dist.clone(), fw.via.clone());
		fw.compute(&g).unwrap();
		assert_eq!(fw.dist, dist);
		assert_eq!(fw.via, via);
	}

	#[test]
	fn parallel_matches_sequential() {
		for seed in 0..5 {
			let g = random_graph(seed, 40, 200, -10);
			let seq = computed(&g);
			let mut par = FloydWarshall::new();
			par.compute_with(&g, true, |_, _| ControlFlow::Continue(())).unwrap();
			assert_eq!(par.dist, seq.dist);
			assert_eq!(par.via, seq.via);
		}
	}

	#[test]
	fn random_graph_properties() {
		for (seed, min_weight) in [(1, 1), (2, 0), (3, -10), (4, -3)] {
			let g = random_graph(seed, 30, 150, min_weight);
			let fw = computed(&g);
			assert_eq!(fw.status(), Ok(Status::Consistent));
			let n = fw.num_nodes();
			for i in (0..n).map(NodeIdx) {
				assert_eq!(fw.distance(i, i), Ok(Some(0)));
				for j in (0..n).map(NodeIdx) {
					let d_ij = fw.distance(i, j).unwrap();
					match fw.path(i, j).unwrap() {
						None => assert_eq!(d_ij, None),
						Some(p) => {
							assert_eq!((p[0], p[p.len() - 1]), (i, j));
							assert_eq!(Some(path_weight(&g, &fw, &p)), d_ij);
						}
					}
					for k in (0..n).map(NodeIdx) {
						if let (Some(d_ik), Some(d_kj)) = (fw.distance(i, k).unwrap(), fw.distance(k, j).unwrap()) {
							let d_ij = d_ij.expect("reachable through k");
							assert!(d_ij <= d_ik + d_kj, "triangle {} {} {}", i, k, j);
						}
					}
				}
			}
		}
	}
}
