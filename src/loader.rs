use crate::{
	errors::LoadError,
	graph::Graph,
	objects::Weight,
};
use csv::{Reader, ReaderBuilder, Trim};
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs::File, io::Read, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
	/// `<from> <to> <weight>` tokens separated by any whitespace
	Whitespace,
	/// `from,to,weight` with a header row
	Csv,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RawEdge<K, W> {
	pub from: K,
	pub to: K,
	pub weight: W,
}

/// Reads triples until the input ends or a token doesn't parse. What was read before that is kept.
pub fn parse_triples<K: FromStr, W: FromStr>(text: &str) -> Vec<(K, K, W)> {
	let mut tokens = text.split_whitespace();
	let mut triples = vec![];
	while let Some(from) = tokens.next() {
		let (to, weight) = match (tokens.next(), tokens.next()) {
			(Some(t), Some(w)) => (t, w),
			_ => {
				warn!("incomplete triple at the end of input after {} edges, ignored", triples.len());
				break;
			}
		};
		match (from.parse(), to.parse(), weight.parse()) {
			(Ok(a), Ok(b), Ok(w)) => triples.push((a, b, w)),
			_ => {
				warn!("malformed triple \"{} {} {}\" after {} edges, the rest of input is ignored", from, to, weight, triples.len());
				break;
			}
		}
	}
	triples
}

pub fn from_reader<K, W, R>(mut rd: R) -> Result<Graph<K, W>, LoadError>
where K: FromStr + Ord + Clone, W: FromStr + Weight, R: Read {
	let mut text = String::new();
	rd.read_to_string(&mut text)?;
	Ok(Graph::from_triples(parse_triples(&text)))
}

pub fn parse_csv<K, W, R>(mut csvr: Reader<R>) -> Result<Graph<K, W>, LoadError>
where K: DeserializeOwned + Ord + Clone, W: DeserializeOwned + Weight, R: Read {
	debug!("csv columns: {:?}", csvr.headers()?);
	let mut triples = vec![];
	for (i, rec) in csvr.deserialize().enumerate() {
		match rec {
			Ok(RawEdge { from, to, weight }) => triples.push((from, to, weight)),
			Err(e) => warn!("record {} skipped: {}", i + 1, e),
		}
	}
	Ok(Graph::from_triples(triples))
}

pub fn csv_reader<R: Read>(buf: R) -> Reader<R> {
	ReaderBuilder::new().trim(Trim::All).from_reader(buf)
}

pub fn from_path<K, W>(path: &str, format: Format) -> Result<Graph<K, W>, LoadError>
where K: FromStr + DeserializeOwned + Ord + Clone, W: FromStr + DeserializeOwned + Weight {
	let file = File::open(path).map_err(|e| LoadError::Io { path: path.into(), msg: e.to_string() })?;
	let g = match format {
		Format::Whitespace => from_reader(file)?,
		Format::Csv => parse_csv(csv_reader(file))?,
	};
	info!("{}: {} nodes, {} edges", path, g.size(), g.num_edges());
	Ok(g)
}
