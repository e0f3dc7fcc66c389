/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `codeblock-filter`: a pandoc JSON filter.
//!
//! Reads a pandoc JSON document on stdin, replaces `graphviz` and `python`
//! code blocks, and writes the document to stdout. Used as
//! `pandoc --filter codeblock-filter`, which passes the output format as the
//! first argument.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeblock_filter::codeblock::CodeBlockFilter;
use codeblock_filter::codeblock::graphviz::DEFAULT_LAYOUT;
use codeblock_filter::filter_context::FilterContext;
use codeblock_filter::options::FilterOptions;
use codeblock_filter::{readers, writers};

/// Set (to any value) to render images into a temporary directory.
const CLEANUP_ENV: &str = "PANDOCFILTER_CLEANUP";

#[derive(Parser, Debug)]
#[command(name = "codeblock-filter")]
#[command(version)]
#[command(about = "Pandoc filter that renders graphviz code blocks and runs python code blocks")]
struct Args {
    /// Output format pandoc is writing (html, latex, ...)
    format: Option<String>,

    /// Python interpreter used for `python` code blocks
    #[arg(long, env = "CODEBLOCK_FILTER_PYTHON", default_value = "python")]
    python: PathBuf,

    /// Graphviz executable used for `graphviz` code blocks
    #[arg(long, env = "CODEBLOCK_FILTER_DOT", default_value = "dot")]
    dot: PathBuf,

    /// Graphviz layout engine
    #[arg(long, env = "CODEBLOCK_FILTER_LAYOUT", default_value = DEFAULT_LAYOUT)]
    layout: String,

    /// Directory in which graphviz-images/ is created
    #[arg(long, env = "CODEBLOCK_FILTER_IMAGE_ROOT")]
    image_root: Option<PathBuf>,

    /// Write images to a temporary directory (also enabled by PANDOCFILTER_CLEANUP)
    #[arg(long)]
    cleanup: bool,
}

impl Args {
    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            python: self.python.clone(),
            dot: self.dot.clone(),
            layout: self.layout.clone(),
            image_root: self.image_root.clone().unwrap_or_default(),
            cleanup: self.cleanup || std::env::var_os(CLEANUP_ENV).is_some(),
        }
    }
}

fn init_tracing() {
    // stdout carries the document
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeblock_filter=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: &Args) -> Result<()> {
    let options = args.filter_options();
    tracing::debug!(?options, format = ?args.format, "starting filter");

    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read document from stdin")?;
    let pandoc = readers::json::read(&mut input.as_slice())
        .context("Failed to parse pandoc JSON from stdin")?;

    let mut ctx = FilterContext::new(args.format.clone().unwrap_or_default());
    let mut filter = CodeBlockFilter::from_options(&options);
    let result = filter.filter_document(pandoc, &mut ctx);

    // diagnostics for work already done are reported even when a later block fails
    let stderr = io::stderr();
    let mut stderr = stderr.lock();
    for line in ctx.take_diagnostics() {
        writeln!(stderr, "{}", line)?;
    }

    let pandoc = result?;

    // serialize fully before writing so a failure leaves stdout empty
    let mut output = Vec::new();
    writers::json::write(&pandoc, &mut output).context("Failed to serialize document")?;
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("Failed to write document to stdout")?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
