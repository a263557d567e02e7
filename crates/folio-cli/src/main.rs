use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_client::{
    OpenAlexPdfProvider, OpenAlexSearcher, ReqwestHttp, RetryPolicy, RetryingTransport,
    SemanticScholarProvider, UnpaywallProvider,
};
use folio_core::cascade::{AcquisitionCascade, Resolution, artifact_blob_key};
use folio_core::{BlobStore, Provider, ProviderBreakers, RetrievalParams, Searcher};
use folio_store::FsBlobStore;

#[derive(Parser)]
#[command(name = "folio", version, about = "Multi-source document retriever")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Free-text search query
    query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 20)]
    max_results: usize,

    /// Earliest publication year
    #[arg(long)]
    year_min: Option<i32>,

    /// Latest publication year
    #[arg(long)]
    year_max: Option<i32>,

    /// Minimum citation count
    #[arg(long)]
    min_citations: Option<u32>,

    /// Include closed-access works in the search
    #[arg(long, default_value_t = false)]
    include_closed: bool,

    /// Contact email for the polite API pools
    #[arg(long, env = "FOLIO_MAILTO")]
    mailto: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for documents and print the matches
    Search {
        #[command(flatten)]
        args: SearchArgs,
    },

    /// Search for documents and download their PDFs
    Retrieve {
        #[command(flatten)]
        args: SearchArgs,

        /// Directory to store downloaded artifacts
        #[arg(short, long, default_value = "./data")]
        outdir: PathBuf,

        /// Semantic Scholar API key (raises rate limits)
        #[arg(long, env = "SEMANTIC_SCHOLAR_KEY")]
        ss_api_key: Option<String>,
    },
}

impl SearchArgs {
    fn params(&self) -> RetrievalParams {
        RetrievalParams {
            max_results: self.max_results,
            year_min: self.year_min,
            year_max: self.year_max,
            min_citations: self.min_citations,
            open_access_only: !self.include_closed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { args } => cmd_search(&args).await?,
        Commands::Retrieve {
            args,
            outdir,
            ss_api_key,
        } => cmd_retrieve(&args, &outdir, ss_api_key).await?,
    }

    Ok(())
}

fn make_transport() -> Result<RetryingTransport<ReqwestHttp>> {
    let http = ReqwestHttp::new().context("Failed to create HTTP client")?;
    Ok(RetryingTransport::new(http, RetryPolicy::default()))
}

async fn cmd_search(args: &SearchArgs) -> Result<()> {
    let transport = make_transport()?;
    let searcher = OpenAlexSearcher::new(transport, args.mailto.clone());

    let targets = searcher
        .search(&args.query, &args.params())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if targets.is_empty() {
        println!("No results for '{}'", args.query);
        return Ok(());
    }

    for (i, t) in targets.iter().enumerate() {
        let year = t.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into());
        println!("{:2}. [{}] {} ({})", i + 1, t.paper_id, t.title, year);
        println!(
            "     {} | {} citations | doi: {}",
            t.authors,
            t.cited_by_count,
            t.doi.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

async fn cmd_retrieve(args: &SearchArgs, outdir: &PathBuf, ss_api_key: Option<String>) -> Result<()> {
    let transport = make_transport()?;
    let searcher = OpenAlexSearcher::new(transport.clone(), args.mailto.clone());
    let blobs = FsBlobStore::at(outdir);

    let mut providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(SemanticScholarProvider::new(transport.clone(), ss_api_key)),
        Arc::new(OpenAlexPdfProvider::new(transport.clone())),
    ];
    if let Some(email) = &args.mailto {
        providers.push(Arc::new(UnpaywallProvider::new(
            transport.clone(),
            email.clone(),
        )));
    } else {
        tracing::warn!("No --mailto given; Unpaywall provider disabled");
    }

    let cascade = AcquisitionCascade::new(providers, ProviderBreakers::default(), blobs.clone());

    tracing::info!("Searching for '{}'", args.query);
    let targets = searcher
        .search(&args.query, &args.params())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Found {} targets", targets.len());

    let mut acquired = 0usize;
    let mut existing = 0usize;
    let mut failed = 0usize;
    let mut per_provider: BTreeMap<String, usize> = BTreeMap::new();

    for (i, target) in targets.iter().enumerate() {
        tracing::info!("[{}/{}] {}", i + 1, targets.len(), target.title);
        let outcome = cascade.resolve(target).await;
        match outcome.resolution {
            Resolution::Acquired { provider, payload } => {
                let key = artifact_blob_key(target);
                blobs
                    .put(&key, &payload)
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
                println!("acquired  {} via {provider} -> {key}", target.paper_id);
                *per_provider.entry(provider).or_default() += 1;
                acquired += 1;
            }
            Resolution::AlreadyStored => {
                println!("exists    {}", target.paper_id);
                existing += 1;
            }
            Resolution::Unresolved => {
                let trail: Vec<String> = outcome.attempts.iter().map(|a| a.label()).collect();
                println!("failed    {} [{}]", target.paper_id, trail.join(", "));
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "Done: {} acquired, {} already stored, {} failed of {} targets",
        acquired,
        existing,
        failed,
        targets.len()
    );
    for (provider, count) in &per_provider {
        println!("  {provider}: {count}");
    }

    Ok(())
}
