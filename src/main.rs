/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::Path;

use stampede::cli::Cli;
use stampede::config::{join_path, ConfigParameter};
use stampede::dispatcher::Dispatcher;
use stampede::progress::{ConsoleProgress, ProgressSink, SilentProgress};
use stampede::report::{slug, ReportWriter, RunSummary};
use stampede::shutdown::Shutdown;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}", level))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = cli.to_config()?;
    let target = config.validate()?;
    let shutdown = Shutdown::on_ctrl_c();

    run_target(config.clone(), config.output_prefix(), cli.quiet, &shutdown).await?;

    if !config.extra_paths().is_empty() && !shutdown.is_triggered() {
        println!("\n{}", "Testing additional pages...".bold());
    }
    for path in config.extra_paths() {
        if shutdown.is_triggered() {
            info!("Interrupted, skipping remaining pages");
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(config.extra_pause()) => {}
            _ = shutdown.wait() => {
                info!("Interrupted, skipping remaining pages");
                break;
            }
        }

        let page = join_path(&target, path)?;
        let mut page_config = config.clone();
        page_config.set_target(page.as_str());
        page_config.set_requests(config.extra_requests());

        let page_slug = match slug(path) {
            s if s.is_empty() => "root".to_string(),
            s => s,
        };
        let prefix = format!("{}_{}", config.output_prefix(), page_slug);
        run_target(page_config, &prefix, cli.quiet, &shutdown).await?;
    }

    Ok(())
}

async fn run_target(
    config: ConfigParameter,
    prefix: &str,
    quiet: bool,
    shutdown: &Shutdown,
) -> Result<()> {
    let dispatcher = Dispatcher::new(config)?;
    let config = dispatcher.config();

    println!(
        "\n{} {}",
        "Starting load test for".bold(),
        dispatcher.target().as_str().cyan()
    );
    println!(
        "Parameters: {} requests, {} concurrent workers",
        config.requests(),
        config.workers()
    );
    if let Some(duration) = config.duration() {
        println!("Test duration cap: {:.1} seconds", duration.as_secs_f64());
    }

    let progress: Box<dyn ProgressSink> = if quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(ConsoleProgress::new())
    };
    let outcome = dispatcher
        .run_until(progress.as_ref(), shutdown.wait())
        .await?;
    if outcome.stopped_early {
        info!(
            "Run stopped early after {} of {} requests",
            outcome.records.len(),
            config.requests()
        );
    }

    if !config.suppress_stats() {
        let summary = RunSummary::from_records(&outcome.records, outcome.elapsed);
        print!("{}", summary.render(outcome.target.as_str()));
    }

    if !config.no_save() {
        let path = ReportWriter::write_json(
            &outcome.records,
            Path::new(config.output_dir()),
            prefix,
            &outcome.started_at,
        )?;
        println!("Results saved to {}", path.display());
    }

    Ok(())
}
