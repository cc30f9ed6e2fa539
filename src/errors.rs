use std::{error::Error, fmt, io};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
	NotComputed,
	NegativeCycle { node: usize },
	OutOfRange { index: usize, len: usize },
	Allocation { msg: String },
	Overflow { source: usize, target: usize },
	Cancelled,
	Programming { msg: String },
}
impl Error for RoutingError {}
impl fmt::Display for RoutingError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::NotComputed => write!(f, "Routing error: shortest paths are not computed"),
			Self::NegativeCycle { node } => write!(f, "Routing error: negative-weight cycle at node {}", node),
			Self::OutOfRange { index, len } => write!(f, "Routing error: node index {} out of range (graph has {} nodes)", index, len),
			Self::Allocation { msg } => write!(f, "Allocation error: {}", msg),
			Self::Overflow { source, target } => write!(f, "Routing error: cost from node {} to node {} overflows the weight type", source, target),
			Self::Cancelled => write!(f, "Routing error: computation cancelled"),
			Self::Programming { msg } => write!(f, "Programming error: {}", msg),
		}
	}
}

pub fn ok_or_pe<T>(data: Option<T>, msg: &str) -> Result<T, RoutingError> {
	data.ok_or(RoutingError::Programming { msg: msg.into() })
}

pub fn ok_or_oor<T>(data: Option<T>, index: usize, len: usize) -> Result<T, RoutingError> {
	data.ok_or(RoutingError::OutOfRange { index, len })
}

#[derive(Debug)]
pub enum LoadError {
	Io { path: String, msg: String },
	Csv { msg: String },
}
impl Error for LoadError {}
impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Io { path, msg } if path.is_empty() => write!(f, "Read error: {}", msg),
			Self::Io { path, msg } => write!(f, "Error opening file {}: {}", path, msg),
			Self::Csv { msg } => write!(f, "Parse error: {}", msg),
		}
	}
}

impl From<io::Error> for LoadError {
	fn from(e: io::Error) -> Self {
		Self::Io { path: String::new(), msg: e.to_string() }
	}
}

impl From<csv::Error> for LoadError {
	fn from(e: csv::Error) -> Self {
		Self::Csv { msg: e.to_string() }
	}
}
