use colored::Colorize;
use quartet_format::{InstrumentSet, QuartetError, Report, Song};

use crate::analysis::{Analysis, Status};

/// Print the bank: one line per populated slot.
pub(crate) fn print_instrument_set(set: &InstrumentSet) {
    println!(
        "  {} {} kHz, {} instrument(s) ({} declared), {} bytes",
        "set:".bold(),
        set.rate_khz,
        set.instrument_count(),
        set.declared_count,
        set.data().len()
    );
    for inst in set.instruments() {
        println!("    {}", inst.to_string().dimmed());
    }
}

/// Print the song header and channel timings.
pub(crate) fn print_song(label: &str, song: &Song) {
    println!(
        "  {} {} kHz, measure {}, tempo {}, {}:{}",
        format!("{}:", label).bold(),
        song.header.rate_khz,
        song.header.measure,
        song.tempo(),
        song.header.time_signature.0,
        song.header.time_signature.1
    );
    for chan in &song.channels {
        println!(
            "    {} {:>5} events {:>8} ticks  loop depth {}",
            chan.tag().to_string().cyan(),
            chan.events.len(),
            chan.ticks,
            chan.max_loop_depth
        );
    }
    println!(
        "    {} {} ticks, {} rows",
        "duration".dimmed(),
        song.ticks,
        song.rows()
    );
}

/// Print warnings and the list of modifications.
pub(crate) fn print_report(report: &Report) {
    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    if report.is_modified() {
        println!("  {}", "List of modifications:".yellow().bold());
        for (i, fix) in report.fixes.iter().enumerate() {
            println!("    {:>2}. {}", i + 1, fix);
        }
    }
}

/// Print a fatal library error.
pub(crate) fn print_quartet_error(err: &QuartetError) {
    println!(
        "  {} [{}] {}: {}",
        "x".red(),
        err.code(),
        err.structure(),
        err.to_string().red()
    );
}

/// Print the status line closing a file.
pub(crate) fn print_status(status: Status) {
    match status {
        Status::Clean => println!("  {} {}", "ok".green(), "clean".dimmed()),
        Status::Modified => println!("  {} {}", "!!".yellow(), "modifications required"),
        Status::Failed => println!("  {} {}", "xx".red(), "failed".red().bold()),
    }
}

/// Print everything known about one analyzed file.
pub(crate) fn print_analysis(analysis: &Analysis) {
    println!(
        "{} {} ({})",
        "Checking:".cyan().bold(),
        analysis.path.display(),
        analysis.kind
    );
    if let Some(set_path) = &analysis.set_path {
        println!("  {} {}", "bank:".dimmed(), set_path.display());
    }
    if let Some(set) = &analysis.set {
        print_instrument_set(set);
    }
    let numbered = analysis.songs.len() > 1;
    for (i, song) in analysis.songs.iter().enumerate() {
        let label = if numbered {
            format!("song #{}", i + 1)
        } else {
            "song".to_string()
        };
        print_song(&label, song);
    }
    print_report(&analysis.report);
    if let Some(err) = &analysis.error {
        print_quartet_error(err);
    }
    print_status(analysis.status());
}
