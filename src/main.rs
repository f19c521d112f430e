use grail::cli::output::Output;
use grail::cli::{Cli, Commands};
use grail::pipeline::AskOptions;
use grail::{AppState, Config, Pipeline};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "grail=debug,info" } else { "grail=info,warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    std::process::exit(run(cli, &out).await);
}

async fn run(cli: Cli, out: &Output) -> i32 {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            out.error(&format!("{} (stage: {})", err, err.stage()));
            return 1;
        }
    };
    let server = config.server.clone();

    let pipeline = match Pipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            out.error(&format!("{} (stage: {})", err, err.stage()));
            return 1;
        }
    };

    match cli.command {
        Commands::Ingest { path } => {
            let report = match pipeline.ingest_dir(&path).await {
                Ok(report) => report,
                Err(err) => {
                    out.error(&format!("{} (stage: {})", err, err.stage()));
                    return 1;
                }
            };

            out.header("Ingestion Report");
            for doc in &report.succeeded {
                out.success(&format!(
                    "{} ({} pages, {} chunks)",
                    doc.document_id, doc.pages, doc.chunks
                ));
            }
            for doc in &report.failed {
                out.error(&format!("{}: {} (stage: {})", doc.source, doc.error, doc.stage));
            }
            out.newline();
            out.kv("documents", &report.total().to_string());
            out.kv("indexed chunks", &report.total_chunks().to_string());
            out.kv("failed", &report.failed.len().to_string());

            if report.is_total_failure() {
                1
            } else if report.is_partial_failure() {
                2
            } else {
                0
            }
        }

        Commands::Ask {
            query,
            k,
            top_n,
            no_rerank,
        } => {
            let options = AskOptions {
                k,
                top_n,
                use_reranker: !no_rerank,
            };

            // Ctrl-C cancels between pipeline stages rather than killing
            // the process mid-request.
            let cancel = CancellationToken::new();
            let cancel_handle = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_handle.cancel();
                }
            });

            match pipeline.ask(&query, &options, &cancel).await {
                Ok(answer) => {
                    println!("{}", answer.text);
                    if !answer.citations.is_empty() {
                        out.header("References");
                        for citation in &answer.citations {
                            out.list_item(&format!(
                                "[{}] {} (p. {})",
                                citation.marker,
                                citation.source,
                                citation.locator.page_label()
                            ));
                        }
                    }
                    0
                }
                Err(err) => {
                    out.error(&format!("{} (stage: {})", err, err.stage()));
                    1
                }
            }
        }

        Commands::Serve { host, port } => {
            // Ctrl-C triggers a graceful shutdown: in-flight requests stop
            // between pipeline stages, then the listener closes.
            let shutdown = CancellationToken::new();
            let shutdown_handle = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    shutdown_handle.cancel();
                }
            });

            let state = AppState {
                pipeline: Arc::new(pipeline),
                shutdown,
            };
            let host = host.unwrap_or(server.host);
            let port = port.unwrap_or(server.port);

            match grail::api::serve(state, &host, port).await {
                Ok(()) => 0,
                Err(err) => {
                    out.error(&format!("{} (stage: {})", err, err.stage()));
                    1
                }
            }
        }
    }
}
