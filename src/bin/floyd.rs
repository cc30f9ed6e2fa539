use apsp::{
	floyd_warshall::FloydWarshall,
	graph::Graph,
	loader::{self, Format},
	objects::TimeCheck,
	report,
};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressFinish, ProgressState, ProgressStyle};
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{
	error::Error, fmt::Display, fs::File, io::{self, BufWriter, Write},
	ops::ControlFlow, str::FromStr,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat { Whitespace, Csv }

impl From<InputFormat> for Format {
	fn from(f: InputFormat) -> Self {
		match f {
			InputFormat::Whitespace => Format::Whitespace,
			InputFormat::Csv => Format::Csv,
		}
	}
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Keys { Int, Str }

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output { Text, Csv }

/// All-pairs shortest paths and routes of a weighted directed graph
#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
	/// Edge list file: `from to weight` per edge
	graph: String,
	#[arg(short, long, value_enum, default_value_t = InputFormat::Whitespace)]
	format: InputFormat,
	/// Node key type; decides the node order of the report
	#[arg(short, long, value_enum, default_value_t = Keys::Int)]
	keys: Keys,
	#[arg(short, long, value_enum, default_value_t = Output::Text)]
	output: Output,
	/// Write the report here instead of stdout
	#[arg(long)]
	out: Option<String>,
	/// Relax the rows of each stage on all cores
	#[arg(long)]
	parallel: bool,
	#[arg(long)]
	progress: bool,
}

fn progress_bar(stages: usize, visible: bool) -> Result<ProgressBar, Box<dyn Error>> {
	if !visible {
		return Ok(ProgressBar::hidden());
	}
	Ok(ProgressBar::new(stages as u64)
		.with_style(ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
		.with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| { let _ = write!(w, "{:.1}s", state.eta().as_secs_f64()); })
		.progress_chars("#>-"))
		.with_finish(ProgressFinish::Abandon))
}

fn run<K>(opts: &Opts) -> Result<(), Box<dyn Error>>
where K: FromStr + DeserializeOwned + Serialize + Ord + Clone + Display {
	let mut tc = TimeCheck::new();
	let graph: Graph<K, i64> = loader::from_path(&opts.graph, opts.format.into())?;
	info!("reading graph: {} s", tc.delta()?);

	let pbr = progress_bar(graph.size(), opts.progress)?;
	let mut fw = FloydWarshall::new();
	let status = fw.compute_with(&graph, opts.parallel, |done, _| {
		pbr.set_position(done as u64);
		ControlFlow::Continue(())
	})?;
	pbr.finish();
	info!("shortest paths: {} s, {:?}", tc.delta()?, status);

	let mut out: Box<dyn Write> = match &opts.out {
		Some(path) => Box::new(BufWriter::new(File::create(path)?)),
		None => Box::new(io::stdout().lock()),
	};
	match opts.output {
		Output::Text => report::write_text(&fw, &mut out)?,
		Output::Csv => report::write_csv(&fw, &mut out)?,
	}
	out.flush()?;
	info!("report: {} s", tc.delta()?);
	Ok(())
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let opts = Opts::parse();
	let res = match opts.keys {
		Keys::Int => run::<i64>(&opts),
		Keys::Str => run::<String>(&opts),
	};
	if let Err(e) = res {
		eprintln!("{}", e);
		std::process::exit(1);
	}
}
