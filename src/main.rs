use anyhow::{Context, Result};
use realgen::{
    cli::{default_config_path, Cli, Commands},
    debug::DebugLogger,
    filter::TableFilter,
    generator::Pipeline,
    schema::SchemaInfoProvider,
    writer::{ArtifactWriter, FsWriter, MemoryWriter},
};
use std::time::Instant;
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            config,
            identifier,
            app_dir,
            source,
            include,
            exclude,
            debug,
            debug_channel,
            dry_run,
        } => {
            let start = Instant::now();

            let config = match config {
                Some(path) => path,
                None => default_config_path()?,
            };
            let provider = source.open()?;
            let filter = TableFilter::from_options(include, exclude)?;

            let mut pipeline = Pipeline::new(provider.as_ref(), app_dir)
                .with_filter(filter)
                .with_debug(DebugLogger::new(debug, debug_channel));

            let mut fs_writer = FsWriter::new();
            let mut memory_writer = MemoryWriter::new();
            let writer: &mut dyn ArtifactWriter = if dry_run {
                &mut memory_writer
            } else {
                &mut fs_writer
            };

            let report = pipeline
                .generate_file(&config, Some(&identifier), writer)
                .with_context(|| format!("Generation failed for {:?}", config))?;

            if dry_run {
                for (path, content) in memory_writer.files() {
                    println!("--- {}", path.display());
                    print!("{}", content);
                }
            }

            let elapsed = start.elapsed();
            println!(
                "\nGenerated {} forms and {} table lists ({} files) in {:.1}s",
                report.forms.len(),
                report.lookups.len(),
                report.written.len(),
                elapsed.as_secs_f64()
            );
        }

        Commands::ListTables { source, database } => {
            let provider = source.open()?;
            println!("Available tables:\n");
            for name in provider.table_names(database.as_deref())? {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}
