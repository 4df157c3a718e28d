use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;

use crate::debug::DEFAULT_DEBUG_CHANNEL;
use crate::schema::{SchemaInfoProvider, SqliteSchemaProvider, StaticSchemaProvider};

#[derive(Parser, Debug)]
#[command(name = "realgen")]
#[command(version, about = "Generate form and table-list configuration from a database schema")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate form and table-list files from a configuration block
    Generate {
        /// Configuration file (default: realgen.yml in the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Configuration block to use
        #[arg(long, default_value = "main")]
        identifier: String,

        /// Application root, substituted for {app_dir} in target directories
        #[arg(short, long, default_value = ".")]
        app_dir: PathBuf,

        #[command(flatten)]
        source: SchemaSource,

        /// Only generate these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Send generator debug messages to the log
        #[arg(long)]
        debug: bool,

        /// Channel name attached to debug messages
        #[arg(long, default_value = DEFAULT_DEBUG_CHANNEL)]
        debug_channel: String,

        /// Print the artifacts instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the tables the schema source knows
    ListTables {
        #[command(flatten)]
        source: SchemaSource,

        /// Database to list (attached SQLite schema or snapshot database)
        #[arg(long)]
        database: Option<String>,
    },
}

/// Where table metadata comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SchemaSource {
    /// SQLite database to introspect
    #[arg(long)]
    pub sqlite: Option<PathBuf>,

    /// Schema snapshot file (YAML, or JSON with a .json extension)
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

impl SchemaSource {
    pub fn open(&self) -> Result<Box<dyn SchemaInfoProvider>> {
        match (&self.sqlite, &self.schema) {
            (Some(db), _) => Ok(Box::new(
                SqliteSchemaProvider::open(db).with_context(|| format!("Failed to open {:?}", db))?,
            )),
            (None, Some(snapshot)) => Ok(Box::new(
                StaticSchemaProvider::from_file(snapshot)
                    .with_context(|| format!("Failed to load {:?}", snapshot))?,
            )),
            (None, None) => bail!("Either --sqlite or --schema is required"),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// `realgen.yml` in the platform configuration directory
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "realgen")
        .context("Could not determine configuration directory")?;
    Ok(proj_dirs.config_dir().join("realgen.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "realgen", "-vv", "generate", "--config", "conf.yml", "--sqlite", "app.db", "-i", "orders,customers",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                config,
                identifier,
                source,
                include,
                dry_run,
                ..
            } => {
                assert_eq!(config, Some(PathBuf::from("conf.yml")));
                assert_eq!(identifier, "main");
                assert_eq!(source.sqlite, Some(PathBuf::from("app.db")));
                assert_eq!(include, Some(vec!["orders".to_string(), "customers".to_string()]));
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_schema_source_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["realgen", "list-tables"]).is_err());
        assert!(Cli::try_parse_from(["realgen", "list-tables", "--sqlite", "a.db", "--schema", "s.yml"]).is_err());
    }
}
