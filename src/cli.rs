use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::extract::TRANSFER_BUFFER_SIZE;
use crate::platform::Destination;

#[derive(Parser, Debug)]
#[command(name = "consolezip")]
#[command(version)]
#[command(about = "Extract ROM archives to console storage and query emulator core profiles", long_about = None)]
#[command(after_help = "Examples:\n  \
  consolezip extract roms.zip -d out         extract every entry of roms.zip into out/\n  \
  consolezip extract roms.zip --target ps3   extract into /dev_hdd1/\n  \
  consolezip rom-ext \"Genesis Plus GX\"       list ROM extensions for a core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract every entry of a ZIP archive, stopping at the first failure
    Extract {
        /// ZIP file path
        #[arg(value_name = "FILE")]
        archive: PathBuf,

        /// Extract files into exdir (must already exist)
        #[arg(short = 'd', value_name = "DIR", conflicts_with = "target")]
        extract_dir: Option<PathBuf>,

        /// Extract to a console storage root instead of a directory
        #[arg(long, value_enum)]
        target: Option<Target>,

        /// Transfer buffer size in bytes
        #[arg(long, value_name = "BYTES", default_value_t = TRANSFER_BUFFER_SIZE,
              value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        buffer_size: usize,
    },

    /// Print the ROM extensions accepted by an emulator core
    RomExt {
        /// Core identity string, e.g. "SNES9x Next"
        #[arg(value_name = "CORE_ID")]
        core_id: String,

        /// Extensions to report for cores without a built-in entry
        #[arg(long, value_name = "EXTS")]
        custom: Option<String>,
    },

    /// Print keybind display names for an emulator core
    Keybinds {
        #[arg(value_name = "CORE_ID")]
        core_id: String,
    },

    /// Print the filesystem-friendly name of an emulator core
    CoreName {
        #[arg(value_name = "CORE_ID")]
        core_id: String,

        /// Maximum name buffer size; longer identities yield an empty name
        #[arg(long, default_value_t = 256)]
        capacity: usize,
    },
}

/// Console storage roots selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Ps3,
    Xbox360,
}

impl Command {
    /// Where `extract` writes its files; the current directory by default.
    pub fn destination(&self) -> Option<Destination> {
        match self {
            Command::Extract {
                extract_dir,
                target,
                ..
            } => Some(match (target, extract_dir) {
                (Some(Target::Ps3), _) => Destination::Ps3,
                (Some(Target::Xbox360), _) => Destination::Xbox360,
                (None, Some(dir)) => Destination::Directory(dir.clone()),
                (None, None) => Destination::Directory(PathBuf::from(".")),
            }),
            _ => None,
        }
    }
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter for the selected verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else if self.is_quiet() {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_defaults_to_current_directory() {
        let cli = Cli::parse_from(["consolezip", "extract", "roms.zip"]);
        assert_eq!(
            cli.command.destination(),
            Some(Destination::Directory(PathBuf::from(".")))
        );
        assert_eq!(cli.log_filter(), "info");
        match cli.command {
            Command::Extract { buffer_size, .. } => assert_eq!(buffer_size, TRANSFER_BUFFER_SIZE),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn extract_to_console_target() {
        let cli = Cli::parse_from(["consolezip", "-qq", "extract", "roms.zip", "--target", "ps3"]);
        assert_eq!(cli.command.destination(), Some(Destination::Ps3));
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn directory_and_target_conflict() {
        let parsed = Cli::try_parse_from([
            "consolezip",
            "extract",
            "roms.zip",
            "-d",
            "out",
            "--target",
            "xbox360",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let parsed =
            Cli::try_parse_from(["consolezip", "extract", "roms.zip", "--buffer-size", "0"]);
        assert!(parsed.is_err());
    }
}
