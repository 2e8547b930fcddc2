use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::WrapErr, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::FilterArgs;
use crate::subcommands::{filter, list_samples};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Subset a VCF to a cohort, recompute allele statistics and write the passing variants
    Filter {
        #[command(flatten)]
        args: FilterArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,
    },

    /// List the sample IDs of a VCF, BCF, checkpoint or sample list
    Samples {
        file: PathBuf,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Filter { threads, .. } => *threads,
            SubCommand::Samples { .. } => 1,
        }
    }

    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Filter { log_and_verbosity, .. }
            | SubCommand::Samples { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }

    pub fn output(&self) -> Option<PathBuf> {
        match self {
            SubCommand::Filter { args, .. } => Some(args.output.clone()),
            SubCommand::Samples { .. } => None,
        }
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    if let Some(output) = args.cmd.output() {
        std::fs::create_dir_all(&output).wrap_err(format!("Error creating directory {output:?}"))?;
    }

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    let threads = cmd.threads();
    match cmd {
        SubCommand::Filter { args, .. } => filter::run(args, threads)?,
        SubCommand::Samples { file, .. } => list_samples::run(file)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, guard))
}

pub fn get_styles() -> clap::builder::Styles {
    let yellow = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow));
    let green = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green));
    let red = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red));

    clap::builder::Styles::styled()
        .usage(anstyle::Style::new().bold().underline().fg_color(yellow))
        .header(anstyle::Style::new().bold().underline().fg_color(yellow))
        .literal(anstyle::Style::new().fg_color(green))
        .invalid(anstyle::Style::new().bold().fg_color(red))
        .error(anstyle::Style::new().bold().fg_color(red))
        .valid(anstyle::Style::new().bold().underline().fg_color(green))
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
