//! CLI for the grail binary.
//!
//! Uses clap for argument parsing and owo-colors for colored terminal
//! output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// G.R.A.I.L - Grounded Retrieval And Inference Layer
#[derive(Parser, Debug)]
#[command(
    name = "grail",
    version,
    about = "G.R.A.I.L - Grounded Retrieval And Inference Layer",
    long_about = "A retrieval-augmented question answering pipeline: ingest documents\n\
                  into a vector index, then ask questions and receive answers with\n\
                  citations back to the source passages.",
    after_help = "EXAMPLES:\n    \
                  grail ingest ./docs             # Index every document in ./docs\n    \
                  grail ask \"What is RAFT?\"       # Answer a question from the index\n    \
                  grail ask -k 20 -n 5 \"...\"      # Widen retrieval and context\n    \
                  grail serve                     # Start the HTTP API"
)]
pub struct Cli {
    /// Enable verbose output (debug-level logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a directory of documents into the vector index
    ///
    /// Supports .txt, .md, and .pdf files. Each document is chunked,
    /// embedded, and upserted; re-running over unchanged files is a no-op.
    Ingest {
        /// Directory containing the documents
        path: PathBuf,
    },

    /// Ask a question against the indexed corpus
    Ask {
        /// The question to answer
        query: String,

        /// Candidates fetched from the vector index
        #[arg(short, long)]
        k: Option<usize>,

        /// Candidates kept for the answer context after reranking
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Skip the rerank stage and answer from retrieval order
        #[arg(long)]
        no_rerank: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host address to bind (overrides GRAIL_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides GRAIL_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
