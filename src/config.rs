use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use torus_life::RuleSet;
use torus_life::Universe;
use torus_life::universe::DEFAULT_HEIGHT;
use torus_life::universe::DEFAULT_WIDTH;

/// Run a Game of Life universe, wrapped around a torus, in the terminal.
#[derive(Debug, Parser)]
#[command(name = "torus-life", version)]
pub struct Config {
    /// Number of columns in the universe.
    #[arg(long, default_value_t = DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Number of rows in the universe.
    #[arg(long, default_value_t = DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Generations to run before exiting.
    #[arg(long, default_value_t = 500)]
    pub generations: u64,

    /// Generations per second.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,

    /// Rule, such as `B3/S23` or `B36/S23`. Overrides the rule of a loaded pattern.
    #[arg(long)]
    pub rule: Option<RuleSet>,

    /// RLE pattern to start from, instead of the default seed.
    #[arg(long)]
    pub pattern: Option<PathBuf>,

    /// Skip the animation and print the final generation as text.
    #[arg(long)]
    pub print: bool,
}

impl Config {
    pub fn frametime(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }

    /// Build the universe this configuration asks for.
    pub fn universe(&self) -> anyhow::Result<Universe> {
        let mut universe = Universe::new(self.width, self.height)
            .context("Failed to create universe")?;

        if let Some(path) = &self.pattern {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            let file = universe
                .load_rle(&bytes)
                .with_context(|| format!("Failed to load pattern {}", path.display()))?;

            info!(
                name = file.name.as_deref().unwrap_or("unnamed"),
                author = file.author.as_deref().unwrap_or("unknown"),
                "loaded pattern"
            );
        }

        if let Some(rule) = self.rule {
            universe.set_rules(rule);
        }

        Ok(universe)
    }
}
