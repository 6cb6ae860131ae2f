use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use research_scout::aggregator::{Aggregator, SearchOutcome};
use research_scout::citation::{CitationAnalyzer, CitationNetwork};
use research_scout::config::{
    default_config_path, find_config_file, load_config, Config, ConfigFile,
};
use research_scout::mcp::McpServer;
use research_scout::models::{
    AggregatedSearchRequest, ArxivSearchRequest, CitationNetworkRequest, OpenAlexSearchRequest,
    SearchDepth, SearchQuery, SemanticScholarSearchRequest, SortBy, SourceType, WebSearchRequest,
};
use research_scout::sources::{Source, SourceRegistry};
use research_scout::ui;
use research_scout::web::{self, TavilyClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Research Scout - search OpenAlex, arXiv and Semantic Scholar, and rank citation networks
#[derive(Parser, Debug)]
#[command(name = "research-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-source academic paper search and citation-network ranking", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Table on a terminal, markdown otherwise
    Auto,
    /// Markdown report, as returned to agents
    Markdown,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Markdown,
            other => other,
        }
    }
}

/// Sort order accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortField {
    Relevance,
    Date,
    Citations,
}

impl From<SortField> for SortBy {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Relevance => SortBy::Relevance,
            SortField::Date => SortBy::PublicationDate,
            SortField::Citations => SortBy::CitationCount,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search several sources at once, with deduplication
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Sources to query (comma-separated: openalex, arxiv, semantic_scholar)
        #[arg(long, short, value_delimiter = ',')]
        sources: Option<Vec<SourceType>>,

        /// Results per source (1-20)
        #[arg(long, short = 'n', default_value_t = 5)]
        max_results: usize,

        /// Keep duplicates found in several sources
        #[arg(long)]
        no_dedup: bool,

        /// Per-source timeout in seconds (10-60)
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Search OpenAlex
    Openalex {
        query: String,

        /// Maximum results (1-200)
        #[arg(long, short = 'n', default_value_t = 10)]
        max_results: usize,

        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort: SortField,

        /// Year filter: 2023, >2020, <2020, 2020-2023
        #[arg(long)]
        year: Option<String>,

        /// Only open-access papers
        #[arg(long)]
        open_access: bool,

        /// Minimum citation count
        #[arg(long)]
        min_citations: Option<u32>,
    },

    /// Search arXiv
    Arxiv {
        query: String,

        /// Maximum results (1-100)
        #[arg(long, short = 'n', default_value_t = 10)]
        max_results: usize,

        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort: SortField,

        /// Submission year filter
        #[arg(long)]
        year: Option<String>,
    },

    /// Search Semantic Scholar
    #[command(alias = "s2")]
    Semantic {
        query: String,

        /// Maximum results (1-100)
        #[arg(long, short = 'n', default_value_t = 10)]
        max_results: usize,

        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort: SortField,

        /// Year filter: 2023, 2020-2023, 2020-, -2015
        #[arg(long)]
        year: Option<String>,

        /// Minimum citation count
        #[arg(long)]
        min_citations: Option<u32>,

        /// Comma-separated fields of study
        #[arg(long)]
        fields_of_study: Option<String>,

        /// Only papers with a free PDF
        #[arg(long)]
        open_access: bool,
    },

    /// Rank a paper's references and citing papers
    #[command(alias = "c")]
    Citations {
        /// Title, DOI, arXiv ID, Semantic Scholar ID or URL
        paper: String,

        /// References to show (1-50)
        #[arg(long, default_value_t = 5)]
        max_references: usize,

        /// Citing papers to show (1-50)
        #[arg(long, default_value_t = 5)]
        max_citations: usize,
    },

    /// General web search through Tavily (needs TAVILY_API_KEY)
    #[command(alias = "w")]
    Web {
        /// Search query
        query: String,

        /// Maximum results (1-20)
        #[arg(long, short = 'n', default_value_t = 5)]
        max_results: usize,

        /// Include a generated answer
        #[arg(long)]
        answer: bool,

        /// Use the slower, more thorough search depth
        #[arg(long)]
        advanced: bool,
    },

    /// List configured sources
    #[command(alias = "ls")]
    Sources,

    /// Run the MCP server on stdio
    Serve,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn init_tracing(cli: &Cli, file_level: Option<&str>, json: bool) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => file_level.unwrap_or("info"),
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("research_scout={}", level)));

    // stderr keeps stdout free for reports and MCP traffic
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let file = match &config_path {
        Some(path) => Some(
            ConfigFile::load(path)
                .with_context(|| format!("reading config file {}", path.display()))?,
        ),
        None => None,
    };
    init_tracing(
        &cli,
        file.as_ref().map(|f| f.logging.level.as_str()),
        file.as_ref().is_some_and(|f| f.logging.is_json()),
    );
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    let format = cli.output.resolve();

    if let Commands::Config { action } = &cli.command {
        return run_config_command(action, &config);
    }

    let registry = Arc::new(SourceRegistry::from_config(&config).context("creating sources")?);

    match cli.command {
        Commands::Search {
            query,
            sources,
            max_results,
            no_dedup,
            timeout,
        } => {
            let mut request = AggregatedSearchRequest::new(query)
                .max_results_per_source(max_results)
                .deduplicate(!no_dedup)
                .timeout_per_source(timeout);
            if let Some(sources) = sources {
                request = request.sources(sources);
            }
            request.validate()?;

            let report = Aggregator::from_config(registry, &config)
                .aggregate(&request)
                .await;

            match format {
                OutputFormat::Json => {
                    let papers: Vec<_> = report
                        .combined()
                        .map(|c| c.papers())
                        .unwrap_or_default();
                    println!("{}", serde_json::to_string_pretty(&papers)?);
                }
                OutputFormat::Table => println!("{}", ui::aggregate_summary(&report)),
                _ => println!("{}", report),
            }
            if report.is_all_failed() {
                std::process::exit(1);
            }
        }

        Commands::Openalex {
            query,
            max_results,
            sort,
            year,
            open_access,
            min_citations,
        } => {
            let request = OpenAlexSearchRequest {
                query,
                max_results,
                sort_by: sort.into(),
                publication_year: year,
                open_access_only: open_access,
                cited_by_count_min: min_citations,
            };
            request.validate()?;
            run_single(&registry, SourceType::OpenAlex, request.to_search_query(), format).await?;
        }

        Commands::Arxiv {
            query,
            max_results,
            sort,
            year,
        } => {
            let request = ArxivSearchRequest {
                query,
                max_results,
                sort_by: sort.into(),
                year,
            };
            request.validate()?;
            run_single(&registry, SourceType::Arxiv, request.to_search_query(), format).await?;
        }

        Commands::Semantic {
            query,
            max_results,
            sort,
            year,
            min_citations,
            fields_of_study,
            open_access,
        } => {
            let request = SemanticScholarSearchRequest {
                query,
                max_results,
                year_filter: year,
                min_citation_count: min_citations,
                fields_of_study,
                sort: sort.into(),
                open_access_only: open_access,
            };
            request.validate()?;
            run_single(
                &registry,
                SourceType::SemanticScholar,
                request.to_search_query(),
                format,
            )
            .await?;
        }

        Commands::Citations {
            paper,
            max_references,
            max_citations,
        } => {
            let request = CitationNetworkRequest {
                paper_identifier: paper,
                max_references,
                max_citations,
            };
            request.validate()?;

            let source = registry
                .citation_source()
                .cloned()
                .context("no citation-capable source is configured")?;
            let network = CitationAnalyzer::from_config(source, &config)
                .analyze(&request)
                .await;

            match format {
                OutputFormat::Json => {
                    let value = match &network {
                        CitationNetwork::Ranked {
                            paper,
                            references,
                            citations,
                        } => serde_json::json!({
                            "paper": paper,
                            "references": references,
                            "citations": citations,
                        }),
                        other => serde_json::json!({ "paper": other.paper() }),
                    };
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Table => println!("{}", ui::network_summary(&network)),
                _ => println!("{}", network),
            }
        }

        Commands::Web {
            query,
            max_results,
            answer,
            advanced,
        } => {
            let mut request = WebSearchRequest::new(query);
            request.max_results = max_results;
            request.include_answer = answer;
            if advanced {
                request.search_depth = SearchDepth::Advanced;
            }
            request.validate()?;

            let response = TavilyClient::from_config(&config)?
                .search(&request)
                .await
                .context("web search failed")?;
            println!("{}", web::search_report(&request, &response));
        }

        Commands::Sources => match format {
            OutputFormat::Json => {
                let ids: Vec<_> = registry
                    .all()
                    .map(|s| {
                        serde_json::json!({
                            "id": s.id(),
                            "name": s.name(),
                            "citations": s.supports_citations(),
                            "doi_lookup": s.supports_doi_lookup(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&ids)?);
            }
            _ => println!("{}", ui::sources_table(registry.all())),
        },

        Commands::Serve => {
            let server = McpServer::new(registry, &config)
                .map_err(|e| anyhow::anyhow!("failed to build MCP server: {}", e))?;
            server
                .run()
                .await
                .map_err(|e| anyhow::anyhow!("MCP server error: {}", e))?;
        }

        Commands::Config { .. } => unreachable!("handled before source construction"),
    }

    Ok(())
}

async fn run_single(
    registry: &SourceRegistry,
    source_type: SourceType,
    query: SearchQuery,
    format: OutputFormat,
) -> Result<()> {
    let source = registry
        .get_required(source_type)
        .map_err(|e| anyhow::anyhow!(e))?;
    let outcome = SearchOutcome::from_result(source.search(&query).await);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome.papers())?),
        OutputFormat::Table => match &outcome {
            SearchOutcome::Failed(err) => {
                eprintln!("{}", ui::status_line(ui::Status::Error, &err.to_string()));
                eprintln!("{}", err.hint());
            }
            other => {
                let papers = other.papers();
                println!(
                    "{}",
                    ui::status_line(
                        ui::Status::Success,
                        &format!("{} papers from {}", papers.len(), source_type)
                    )
                );
                println!("{}", ui::papers_table(papers));
            }
        },
        _ => println!("{}", outcome.render(source_type, &query)),
    }

    if let SearchOutcome::Failed(err) = outcome {
        anyhow::bail!("{} search failed ({})", source_type, err.kind());
    }
    Ok(())
}

fn run_config_command(action: &ConfigCommands, config: &Config) -> Result<()> {
    match action {
        ConfigCommands::Init { path, force } => {
            let path = path
                .clone()
                .or_else(default_config_path)
                .context("no config directory available; pass --path")?;
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            ConfigFile::create_default().save(&path)?;
            println!(
                "{}",
                ui::status_line(
                    ui::Status::Success,
                    &format!("Wrote {}", path.display())
                )
            );
        }
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.api_keys.semantic_scholar.is_some() {
                shown.api_keys.semantic_scholar = Some("********".to_string());
            }
            if shown.api_keys.tavily.is_some() {
                shown.api_keys.tavily = Some("********".to_string());
            }
            println!("{}", toml::to_string_pretty(&shown)?);
        }
    }
    Ok(())
}
