//! Builds a [`Generator`] from the command line and the config file

use anyhow::{Context, Result};
use lsdgen_config::GeneratorConfig;
use lsdgen_manifest::normalize_path;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::Cli;
use crate::generator::Generator;

pub struct GeneratorFactory {
    cwd: PathBuf,
}

impl GeneratorFactory {
    pub fn new(cwd: PathBuf) -> Self {
        GeneratorFactory { cwd }
    }

    /// Effective config: defaults, then the config file, then the command line
    pub fn config(&self, cli: &Cli) -> Result<GeneratorConfig> {
        let config = GeneratorConfig::load(&self.cwd)
            .with_context(|| format!("Failed to load {:?}", GeneratorConfig::path(&self.cwd)))?;
        Ok(config.with_overrides(&self.cwd, cli.overrides())?)
    }

    pub fn create_generator(&self, packages: &[String], config: GeneratorConfig) -> Result<Generator> {
        let package_roots: Vec<PathBuf> = expand_package_paths(&self.cwd, packages)?
            .into_iter()
            .filter(|root| {
                let ignored = config.is_package_ignored(&self.cwd, root);
                if ignored {
                    debug!("Ignoring package {:?}", root);
                }
                !ignored
            })
            .collect();
        Ok(Generator::new(self.cwd.clone(), config, package_roots))
    }
}

/// Absolute package roots for the given arguments
///
/// No arguments means the working directory. An argument ending in `*`
/// stands for every directory inside it, in name order.
pub fn expand_package_paths(cwd: &Path, packages: &[String]) -> Result<Vec<PathBuf>> {
    if packages.is_empty() {
        return Ok(vec![cwd.to_path_buf()]);
    }

    let mut roots = Vec::new();
    for package in packages {
        let Some(parent) = package.strip_suffix('*') else {
            roots.push(normalize_path(&cwd.join(package)));
            continue;
        };
        let dir = normalize_path(&cwd.join(parent));
        let entries = fs::read_dir(&dir).with_context(|| format!("Failed to list packages in {:?}", dir))?;
        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        children.sort();
        roots.extend(children);
    }
    Ok(roots)
}
