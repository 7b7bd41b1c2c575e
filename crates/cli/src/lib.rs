// The verbosity stuff is cribbed from https://github.com/clap-rs/clap-verbosity-flag/blob/c621a6a8a7c0b6df8f1464a985a5d076b4915693/src/lib.rs and updated for tracing

#![deny(unused_crate_dependencies)]

use anyhow::{Result, anyhow};
use ceos_ard_validate::{Config, Document, HttpFetcher, Profile, Report, Validator};
use clap::{CommandFactory, Parser, Subcommand};
use std::{io::Write, time::Duration};
use tokio::io::AsyncReadExt;
use tracing::metadata::Level;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{
    Layer, filter, fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// ceos-ard: Validate STAC items against the CEOS Analysis Ready Data for Land (CARD4L) extension
#[derive(Debug, Parser)]
pub struct CeosArd {
    #[command(subcommand)]
    command: Command,

    /// The output format.
    ///
    /// Possible values (default: text):
    ///
    /// - text: one block per offending path, with suggestions
    /// - json: the report as a JSON object keyed by path
    #[arg(
        short = 'o',
        long = "output-format",
        global = true,
        verbatim_doc_comment
    )]
    output_format: Option<OutputFormat>,

    /// Whether to print compact JSON output.
    ///
    /// By default, JSON output is printed "pretty".
    #[arg(short = 'c', long = "compact-json", global = true)]
    compact_json: Option<bool>,

    /// The CARD4L product family to validate against.
    ///
    /// Possible values (default: optical):
    ///
    /// - optical: surface reflectance and surface temperature
    /// - sar:     radar backscatter
    #[arg(long = "profile", global = true, verbatim_doc_comment)]
    profile: Option<Profile>,

    /// Use this CARD4L schema url instead of the profile's.
    #[arg(long = "card4l-schema", global = true)]
    card4l_schema: Option<String>,

    /// Require an extension in addition to CARD4L, e.g. `--require https://stac-extensions.github.io/eo/v1.0.0/schema.json`.
    ///
    /// Can be passed more than once.
    #[arg(long = "require", global = true)]
    require: Vec<String>,

    /// Require the eo, projection, raster, and view extensions.
    #[arg(long = "require-optical-extensions", global = true, default_value_t = false)]
    require_optical_extensions: bool,

    /// How long to wait for any one schema, in seconds.
    #[arg(long = "timeout", global = true, default_value_t = 30)]
    timeout: u64,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::verbose_help(),
        long_help = ErrorLevel::verbose_long_help(),
    )]
    verbose: u8,

    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::quiet_help(),
        long_help = ErrorLevel::quiet_long_help(),
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

/// A ceos-ard subcommand.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validates an item against CARD4L and every extension it declares.
    ///
    /// Extensions that must be present but aren't declared are reported too.
    Validate {
        /// The item href, either a local path or a url.
        ///
        /// To read from standard input, pass `-` or don't provide an argument at all.
        href: Option<String>,
    },

    /// Validates an item's jsonschema.
    ///
    /// Injects the CARD4L schema into the item's `stac_extensions` and prints
    /// the raw json-schema errors.
    ValidateJsonschema {
        /// The item href, either a local path or a url.
        ///
        /// To read from standard input, pass `-` or don't provide an argument at all.
        href: Option<String>,
    },

    /// Generate completion scripts for a given shell.
    GenerateCompletions {
        /// The shell to generate completion scripts for.
        shell: clap_complete::Shell,
    },
}

/// How reports are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// A JSON object keyed by path
    Json,
}

#[derive(Copy, Clone, Debug, Default)]
struct ErrorLevel;

impl CeosArd {
    /// Runs this command.
    ///
    /// If `init_tracing_subscriber` is `false`, it is expected that the caller
    /// is setting up the appropriate logging.
    pub async fn run(self, init_tracing_subscriber: bool) -> Result<()> {
        if init_tracing_subscriber {
            let indicatif_layer = IndicatifLayer::new();
            let level = self.log_level();
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(
                            indicatif_layer
                                .get_stderr_writer()
                                .with_max_level(level.unwrap_or(Level::ERROR)),
                        )
                        .with_filter(filter::filter_fn(move |_| level.is_some())),
                )
                .with(indicatif_layer)
                .init();
        }
        match self.command {
            Command::Validate { ref href } => {
                let document = self.get(href.as_deref()).await?;
                let report = self.validator()?.validate(&document).await;
                self.print(report)
            }
            Command::ValidateJsonschema { ref href } => {
                let document = self.get(href.as_deref()).await?;
                let report = self.validator()?.validate_jsonschema(&document).await;
                self.print(report)
            }
            Command::GenerateCompletions { shell } => {
                let mut command = CeosArd::command();
                clap_complete::generate(shell, &mut command, "ceos-ard", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    /// Returns the validation configuration described by the arguments.
    pub fn config(&self) -> Config {
        let mut config = Config::new(self.profile.unwrap_or_default())
            .with_timeout(Duration::from_secs(self.timeout));
        if let Some(card4l_schema) = self.card4l_schema.as_ref() {
            config = config.with_card4l(card4l_schema);
        }
        if self.require_optical_extensions {
            config = config.with_optical_extensions();
        }
        for url in &self.require {
            config = config.with_required_extension(url);
        }
        config
    }

    /// Returns the set output format.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<Level> {
        level_enum(self.verbosity())
    }

    fn validator(&self) -> Result<Validator> {
        Validator::new(self.config()).map_err(Into::into)
    }

    async fn get(&self, href: Option<&str>) -> Result<Document> {
        let href = href.and_then(|s| if s == "-" { None } else { Some(s) });
        if let Some(href) = href {
            let fetcher = HttpFetcher::new(Duration::from_secs(self.timeout))?;
            let document = Document::from_href(href, &fetcher).await?;
            Ok(document)
        } else {
            let mut buf = Vec::new();
            let _ = tokio::io::stdin().read_to_end(&mut buf).await?;
            let document = Document::from_slice(&buf)?;
            Ok(document)
        }
    }

    fn print(&self, report: Report) -> Result<()> {
        let valid = report.is_empty();
        let mut stdout = std::io::stdout();
        match self.output_format() {
            OutputFormat::Text => {
                if valid {
                    writeln!(stdout, "OK")?;
                } else {
                    write!(stdout, "{report}")?;
                }
            }
            OutputFormat::Json => {
                if self.compact_json.unwrap_or_default() {
                    serde_json::to_writer(&mut stdout, &report)?;
                } else {
                    serde_json::to_writer_pretty(&mut stdout, &report)?;
                }
                writeln!(stdout)?;
            }
        }
        stdout.flush()?;
        if valid {
            Ok(())
        } else {
            Err(anyhow!("one or more validation errors"))
        }
    }

    fn verbosity(&self) -> i8 {
        level_value(ErrorLevel::default()) - (self.quiet as i8) + (self.verbose as i8)
    }
}

impl ErrorLevel {
    fn default() -> Option<Level> {
        Some(Level::ERROR)
    }

    fn verbose_help() -> Option<&'static str> {
        Some("Increase verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        None
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Decrease verbosity")
    }

    fn quiet_long_help() -> Option<&'static str> {
        None
    }
}

fn level_enum(verbosity: i8) -> Option<Level> {
    match verbosity {
        i8::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i8::MAX => Some(Level::TRACE),
    }
}

fn level_value(level: Option<Level>) -> i8 {
    match level {
        None => -1,
        Some(Level::ERROR) => 0,
        Some(Level::WARN) => 1,
        Some(Level::INFO) => 2,
        Some(Level::DEBUG) => 3,
        Some(Level::TRACE) => 4,
    }
}

#[cfg(test)]
use {assert_cmd as _, mockito as _, predicates as _, rstest as _, tempfile as _};
