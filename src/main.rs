use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod corpus;
mod errors;
mod semantic;
#[cfg(test)]
mod tests;
mod web;

use cli::CorpusArgs;
use config::Config;
use corpus::CorpusStore;
use semantic::{EmbeddingModel, SimilarityService};

/// Load config, corpus and model, then build the index.
///
/// Any failure here is fatal: there is nothing to serve without an index.
fn build_service(args: &CorpusArgs) -> anyhow::Result<(Config, SimilarityService)> {
    let config = Config::load(args.config.as_deref())?
        .with_corpus_overrides(args.corpus.clone(), args.max_rows)
        .context("invalid command-line overrides")?;

    let corpus = CorpusStore::load(&config.corpus.path, config.corpus.max_rows)
        .with_context(|| format!("failed to load corpus {}", config.corpus.path.display()))?;

    let sem = &config.semantic_search;
    let model = EmbeddingModel::new(&sem.model, sem.cache_dir.clone())
        .context("failed to load embedding model")?;

    let service = SimilarityService::build(corpus, Box::new(model), sem.search_settings())
        .context("failed to build index")?;

    Ok((config, service))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Serve { corpus_args, bind } => {
            let (config, service) = build_service(&corpus_args)?;
            let bind = bind.unwrap_or(config.server.bind);

            web::start_daemon(Arc::new(service), &bind, config.server.max_upload_bytes)
        }

        cli::Command::Search { file, corpus_args } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let (_, service) = build_service(&corpus_args)?;
            let response = service.search_upload(&bytes)?;

            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}
