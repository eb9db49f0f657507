//! lsdgen: generates linked-data component files for packages
//!
//! The binary is a thin wrapper around [`run`]; the modules are public so
//! integration tests can drive the pieces directly.

pub mod cli;
pub mod factory;
pub mod generator;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::factory::GeneratorFactory;
use crate::generator::display_root;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let factory = GeneratorFactory::new(cwd.clone());
    let config = factory.config(&cli)?;

    if let Err(e) = lsdgen_logger::init_with_verbosity(cli.verbosity_level(&config.log_level)) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_logging();

    let generator = factory.create_generator(&cli.packages, config)?;
    if generator.package_roots().is_empty() {
        lsdgen_logger::warn("No packages to generate");
        return Ok(());
    }
    for root in generator.package_roots() {
        lsdgen_logger::debug(&format!("Package: {}", display_root(&cwd, root)));
    }

    let outputs = generator.generate()?;
    let total: usize = outputs.iter().map(|output| output.component_count()).sum();
    lsdgen_logger::info(&format!(
        "Generated {} components in {} packages",
        total,
        outputs.len()
    ));
    Ok(())
}

/// Library logs go to stderr; `RUST_LOG` wins over the verbosity flags
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| lsdgen_logger::tracing_directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
