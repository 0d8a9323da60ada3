use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::config::{Config, DecodePolicy, RunSettings};
use crate::output::{self, CsvExporter, DrainProgress};
use crate::providers::travis::TravisProvider;

#[derive(Parser)]
#[command(name = "travis-dump")]
#[command(author, version, about = "Export Travis CI build history to CSV", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./travis-dump.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CSV file to write (truncated if it exists)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every build of a Travis CI repository
    Travis {
        #[arg(short, long, env = "TRAVIS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(short, long)]
        url: Option<String>,

        /// Repository id or slug
        #[arg(short, long, env = "TRAVIS_REPO")]
        repo: Option<String>,

        /// Builds per page (1-100)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Builds to skip, newest first
        #[arg(long)]
        offset: Option<u64>,

        /// Abort on a page that fails to decode instead of stopping early
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

impl Cli {
    /// Layer command-line values over the loaded configuration.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }

        match &self.command {
            Commands::Travis {
                token,
                url,
                repo,
                limit,
                offset,
                strict,
            } => {
                let travis = &mut config.travis;
                if let Some(token) = token {
                    travis.token = Some(token.clone());
                }
                if let Some(url) = url {
                    travis.base_url = url.clone();
                }
                if let Some(repo) = repo {
                    travis.repository = Some(repo.clone());
                }
                if let Some(limit) = limit {
                    travis.limit = *limit;
                }
                if let Some(offset) = offset {
                    travis.offset = *offset;
                }
                if *strict {
                    travis.decode_policy = DecodePolicy::Strict;
                }
            }
        }
    }

    async fn execute_travis(&self, settings: RunSettings) -> Result<()> {
        info!(
            "Exporting Travis CI builds for repository: {}",
            settings.repository
        );

        let provider = TravisProvider::new(&settings)?;
        let mut exporter = CsvExporter::create(&settings.output_path)?;
        let progress = DrainProgress::start(&settings.repository);

        let summary = provider
            .drain(settings.offset, &mut exporter, &progress)
            .await?;

        let written = exporter.rows_written();
        exporter.finish()?;
        progress.finish();

        info!(
            "Fetched {} pages, wrote {written} of {} builds",
            summary.pages, summary.expected
        );
        eprintln!(
            "  {} {}",
            output::dim("Builds written to:"),
            output::cyan(settings.output_path.display())
        );

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        let settings = RunSettings::try_from(config)?;

        match &self.command {
            Commands::Travis { .. } => self.execute_travis(settings).await,
        }
    }
}
