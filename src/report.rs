use crate::{
	errors::{ok_or_pe, RoutingError},
	objects::{NodeIdx, Status},
	traits::AllPairs,
};
use serde::Serialize;
use std::{error::Error, fmt::Display, io::Write};

#[derive(Serialize)]
struct PairRow<'a, K, W> {
	source: &'a K,
	target: &'a K,
	cost: Option<W>,
	path: String,
}

fn join<K: Display>(keys: &[&K], sep: &str) -> String {
	keys.iter().map(|k| k.to_string()).collect::<Vec<String>>().join(sep)
}

fn pairs(n: usize) -> impl Iterator<Item = (NodeIdx, NodeIdx)> {
	(0..n).flat_map(move |i| (0..n).filter(move |j| *j != i).map(move |j| (NodeIdx(i), NodeIdx(j))))
}

/// Console report: every ordered pair of distinct nodes, or only the negative cycle notice.
pub fn write_text<P, Wr>(apsp: &P, out: &mut Wr) -> Result<(), Box<dyn Error>>
where P: AllPairs, P::Key: Display, P::Weight: Display, Wr: Write {
	if let Status::NegativeCycle(i) = apsp.status()? {
		let key = ok_or_pe(apsp.node(i), "cycle node is not in the graph")?;
		writeln!(out, "This graph has a negative-weight cycle at node {}", key)?;
		return Ok(());
	}

	for (i, j) in pairs(apsp.num_nodes()) {
		let a = ok_or_pe(apsp.node(i), "node is not in the graph")?;
		let b = ok_or_pe(apsp.node(j), "node is not in the graph")?;
		writeln!(out, "{}->{}:", a, b)?;
		match (apsp.distance(i, j)?, apsp.path_keys(i, j)?) {
			(Some(cost), Some(path)) => {
				writeln!(out, "Cost: {}", cost)?;
				writeln!(out, "Path: {}", join(&path, " "))?;
			},
			_ => writeln!(out, "No path exists.")?,
		}
		writeln!(out)?;
	}
	Ok(())
}

/// One csv row per ordered pair: `source,target,cost,path`, path nodes joined by `;`.
pub fn write_csv<P, Wr>(apsp: &P, out: Wr) -> Result<(), Box<dyn Error>>
where P: AllPairs, P::Key: Display + Serialize, P::Weight: Serialize, Wr: Write {
	if let Status::NegativeCycle(i) = apsp.status()? {
		return Err(Box::new(RoutingError::NegativeCycle { node: i.0 }));
	}

	let mut cr = csv::Writer::from_writer(out);
	for (i, j) in pairs(apsp.num_nodes()) {
		let path = apsp.path_keys(i, j)?.map(|p| join(&p, ";")).unwrap_or_default();
		cr.serialize(PairRow {
			source: ok_or_pe(apsp.node(i), "node is not in the graph")?,
			target: ok_or_pe(apsp.node(j), "node is not in the graph")?,
			cost: apsp.distance(i, j)?,
			path,
		})?;
	}
	cr.flush()?;
	Ok(())
}
