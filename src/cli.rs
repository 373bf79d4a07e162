use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CorpusArgs {
    /// YAML config file. Defaults apply when omitted.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// CSV file with the FIR records (overrides corpus.path)
    #[clap(long)]
    pub corpus: Option<PathBuf>,

    /// Number of rows to index (overrides corpus.max_rows)
    #[clap(long)]
    pub max_rows: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the index and serve the upload endpoint
    Serve {
        #[command(flatten)]
        corpus_args: CorpusArgs,

        /// Address to listen on (overrides server.bind)
        #[clap(short, long)]
        bind: Option<String>,
    },

    /// Build the index and search with a local report file
    Search {
        /// Text file describing the crime
        file: PathBuf,

        #[command(flatten)]
        corpus_args: CorpusArgs,
    },
}
