//! Command-line arguments

use clap::Parser;
use lsdgen_config::CliOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "lsdgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Generates components files for the declared types of a package",
    long_about = "lsdgen turns the exported classes and interfaces of one or more packages into \
                  linked-data component files, a components index and a JSON-LD context."
)]
pub struct Cli {
    /// The directories of the packages to look in, defaults to the working directory.
    /// A trailing `*` expands to every entry of the directory.
    pub packages: Vec<String>,

    /// Relative path to the directory containing source files
    #[arg(short = 's', long, value_name = "DIR")]
    pub source: Option<String>,

    /// Relative path to the directory that will contain components files
    #[arg(short = 'c', long = "components", value_name = "DIR")]
    pub destination: Option<String>,

    /// Extension for components files (without .)
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Relative path to a JSON file with class names to ignore
    #[arg(short = 'i', long = "ignore", value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// Custom JSON-LD module prefix
    #[arg(short = 'r', long = "prefix", value_name = "PREFIX")]
    pub module_prefix: Option<String>,

    /// The logger level (error, warn, info, debug)
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write componentsjs-generator-debug-state.json with the resolved module state
    #[arg(long)]
    pub debug_state: bool,

    #[arg(short, long, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug)")]
    pub verbose: u8,
}

impl Cli {
    /// Values that override the config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            source: self.source.clone(),
            destination: self.destination.clone(),
            extension: self.extension.clone(),
            ignore_file: self.ignore_file.clone(),
            log_level: self.log_level.clone(),
            module_prefix: self.module_prefix.clone(),
            debug_state: self.debug_state,
        }
    }

    /// Effective verbosity: `-q` wins over `-v`, which wins over the configured level
    ///
    /// 0 = warnings and errors, 1 = info, 2 = debug
    pub fn verbosity_level(&self, configured_level: &str) -> u8 {
        if self.quiet {
            0
        } else if self.verbose > 0 {
            2
        } else {
            lsdgen_logger::verbosity_for_level(configured_level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "lsdgen", "packages/*", "-s", "src", "-c", "out", "-e", "json", "-i", "ignore.json", "-r",
            "ex", "-l", "debug", "--debug-state",
        ]);
        let Ok(cli) = cli else {
            panic!("arguments should parse");
        };
        assert_eq!(cli.packages, vec!["packages/*"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.source.as_deref(), Some("src"));
        assert_eq!(overrides.destination.as_deref(), Some("out"));
        assert_eq!(overrides.extension.as_deref(), Some("json"));
        assert_eq!(overrides.ignore_file, Some(PathBuf::from("ignore.json")));
        assert_eq!(overrides.module_prefix.as_deref(), Some("ex"));
        assert!(overrides.debug_state);
    }

    #[test]
    fn test_verbosity_level() {
        let Ok(cli) = Cli::try_parse_from(["lsdgen"]) else {
            panic!("arguments should parse");
        };
        assert_eq!(cli.verbosity_level("info"), 1);
        assert_eq!(cli.verbosity_level("warn"), 0);

        let Ok(cli) = Cli::try_parse_from(["lsdgen", "-v"]) else {
            panic!("arguments should parse");
        };
        assert_eq!(cli.verbosity_level("warn"), 2);

        let Ok(cli) = Cli::try_parse_from(["lsdgen", "-q", "-v"]) else {
            panic!("arguments should parse");
        };
        assert_eq!(cli.verbosity_level("debug"), 0);
    }
}
