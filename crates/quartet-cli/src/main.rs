//! Quartet doctor - check and repair Quartet instrument banks and songs
//!
//! This binary checks `.set`, `.4v`, `.4q` and `.quar` files, writes repaired
//! copies, splits containers and extracts instrument samples.

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

// Use modules from the library crate
use quartet_cli::{commands, logging};

/// Quartet doctor - Quartet tracker file checker and repairer
#[derive(Parser)]
#[command(name = "quartet-doctor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files and list the repairs they need
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<String>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Repair a file and write the result to a directory
    Fix {
        /// Input file (.4q, .quar, .set or .4v)
        input: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: String,
    },

    /// Split a .4q or .quar container into song, bank and info files
    Demux {
        /// Container file
        input: String,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Convert the info text from the Atari ST charset to UTF-8
        #[arg(long)]
        utf8: bool,
    },

    /// Write every instrument as an 8-bit mono WAV file
    Extract {
        /// Input file (.4q, .quar, .set, or a .4v with its .set)
        input: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Check {
            paths,
            recursive,
            json,
        } => commands::check::run(&paths, recursive, json),
        Commands::Fix { input, out_dir } => commands::fix::run(&input, &out_dir),
        Commands::Demux {
            input,
            out_dir,
            utf8,
        } => commands::demux::run(&input, out_dir.as_deref(), utf8),
        Commands::Extract { input, out_dir } => commands::extract::run(&input, &out_dir),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(2)
        }
    }
}
