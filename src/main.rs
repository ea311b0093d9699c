use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod config;
mod factory;
mod mcp;
mod recommender;
#[cfg(test)]
mod tests;
mod web;

use cli::Command;
use config::Config;
use factory::AppFactory;
use web::RecommendResponse;

/// Exit code for rejected user input
const EXIT_INVALID_INPUT: i32 = 2;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging();

    let base_path = AppFactory::get_base_path()?;
    let mut config = Config::load_with(&base_path)?;

    if let Some(catalog) = args.catalog {
        config.catalog_path = Some(catalog);
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    config.validate()?;

    match args.command {
        Command::Catalog {} => {
            let catalog = AppFactory::load_catalog(&config)?;
            println!("{}", serde_json::to_string_pretty(catalog.items())?);
            Ok(())
        }

        Command::Serve { addr, warm } => {
            if let Some(addr) = addr {
                config.listen_addr = addr;
            }
            config.validate()?;

            let recommender = AppFactory::create_recommender(&config)?;
            if warm {
                recommender
                    .warm_up()
                    .context("Failed to embed the catalog")?;
            }

            web::start_daemon(recommender, &config)
        }

        Command::Mcp { warm } => {
            let recommender = AppFactory::create_recommender(&config)?;
            if warm {
                recommender
                    .warm_up()
                    .context("Failed to embed the catalog")?;
            }

            mcp::start_stdio(recommender, &config)
        }

        Command::Recommend { mood_text, k, json } => {
            let (mood_text, k) = match cli::resolve_request(&mood_text, k, config.default_k) {
                Ok(request) => request,
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(EXIT_INVALID_INPUT);
                }
            };

            let recommender = AppFactory::create_recommender(&config)?;
            let hits = match recommender.recommend(&mood_text, k) {
                Ok(hits) => hits,
                Err(err) if err.is_client_error() => {
                    eprintln!("error: {err}");
                    std::process::exit(EXIT_INVALID_INPUT);
                }
                Err(err) => return Err(err.into()),
            };

            if json {
                let payload = RecommendResponse {
                    model: recommender.model().to_string(),
                    results: hits,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{}", cli::render_hits(recommender.model(), &hits));
            }

            Ok(())
        }
    }
}
