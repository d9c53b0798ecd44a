//! Main entry point for the consolezip CLI application.

use anyhow::{Context, Result};
use clap::Parser;

use consolezip::cli::Command;
use consolezip::profile::{self, RomExtensions};
use consolezip::{Cli, Extractor};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_target(false)
        .init();

    let destination = cli.command.destination();
    match cli.command {
        Command::Extract {
            archive,
            buffer_size,
            ..
        } => {
            // Every extract invocation has a destination, defaulting to "."
            let destination = destination.context("no extraction destination")?;
            Extractor::zip(destination)
                .with_buffer_size(buffer_size)
                .extract_archive(&archive)
                .with_context(|| format!("extracting {}", archive.display()))?;
        }
        Command::RomExt { core_id, custom } => {
            let mut extensions = RomExtensions::new();
            if let Some(custom) = custom {
                extensions.set_custom(custom);
            }
            match extensions.lookup(&core_id) {
                Some(list) => println!("{}", list),
                None => anyhow::bail!("no ROM extensions known for core '{}'", core_id),
            }
        }
        Command::Keybinds { core_id } => {
            print!("{}", profile::keybind_names(&core_id));
        }
        Command::CoreName { core_id, capacity } => {
            println!("{}", profile::core_name_from_id(&core_id, capacity));
        }
    }

    Ok(())
}
