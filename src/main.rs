use std::io;
use std::io::Write;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use crossterm::cursor;
use crossterm::execute;
use crossterm::queue;
use crossterm::style;
use crossterm::terminal;
use tracing_subscriber::EnvFilter;

use torus_life::Universe;
use torus_life::render::Braille;

use config::Config;

mod config;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't tear the frame drawn on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    let mut universe = config.universe()?;

    if config.print {
        for _ in 0..config.generations {
            universe.tick();
        }

        print!("{universe}");

        return Ok(());
    }

    let mut stdout = io::stdout();

    // Keep the last terminal row for the status line
    let (cols, rows) = terminal::size().context("Failed to read the terminal size")?;
    let mut frame = Braille::for_terminal(cols, rows.saturating_sub(1));

    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
    let res = animate(&mut stdout, &mut universe, &mut frame, &config);
    execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;

    res
}

fn animate<W: Write>(
    out: &mut W,
    universe: &mut Universe,
    frame: &mut Braille,
    config: &Config,
) -> anyhow::Result<()> {
    let frametime = config.frametime();

    for _ in 0..config.generations {
        let t = Instant::now();

        draw(out, universe, frame)?;
        universe.tick();

        thread::sleep(frametime.saturating_sub(t.elapsed()));
    }

    // The last generation stays on screen
    draw(out, universe, frame)
}

fn draw<W: Write>(out: &mut W, universe: &Universe, frame: &mut Braille) -> anyhow::Result<()> {
    frame.draw(universe);
    let s = frame.render();

    queue!(
        out,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0),
    )?;

    for line in s.lines() {
        queue!(out, style::Print(line), cursor::MoveToNextLine(1))?;
    }

    queue!(
        out,
        style::Print(format!(
            "generation {} | population {} | {}",
            universe.generation(),
            universe.population(),
            universe.rules(),
        ))
    )?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use torus_life::render::Braille;

    use super::animate;
    use crate::config::Config;

    #[test]
    fn animation_runs_requested_generations() {
        let config =
            Config::try_parse_from(["torus-life", "--generations", "3", "--fps", "1000"]).unwrap();
        let mut universe = config.universe().unwrap();
        let mut frame = Braille::new(8, 8);
        let mut out = Vec::new();

        animate(&mut out, &mut universe, &mut frame, &config).unwrap();

        let mut printed = config.universe().unwrap();
        for _ in 0..config.generations {
            printed.tick();
        }

        assert_eq!(universe.generation(), 3);
        assert_eq!(universe.cells(), printed.cells());

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("generation 3 |"));
        assert!(!out.contains("generation 4"));
    }
}
