//! Helpers shared by the action implementations.

use crate::{
    actions::CliActionError,
    commands::params::{PARAMETER_FORMAT, PARAMETER_HEADERS, PARAMETER_PRETTY},
    configuration::Configuration,
    format::{Formattable, OutputFormat, OutputFormatOptions},
};
use clap::ArgMatches;
use color_print::ceprintln;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Resolve the output format: `--format` (or `SUP_FORMAT`) first, then the
/// configured default.
pub fn output_format(
    matches: &ArgMatches,
    configuration: &Configuration,
) -> Result<OutputFormat, CliActionError> {
    let format = matches
        .get_one::<String>(PARAMETER_FORMAT)
        .map(String::as_str)
        .unwrap_or_else(|| configuration.output_format());
    let options = OutputFormatOptions {
        with_headers: matches.get_flag(PARAMETER_HEADERS),
        pretty: matches.get_flag(PARAMETER_PRETTY),
    };
    Ok(OutputFormat::from_string_with_options(format, options)?)
}

pub fn print_formatted<T: Formattable + ?Sized>(
    item: &T,
    format: &OutputFormat,
) -> Result<(), CliActionError> {
    let output = item.format(format)?;
    // CSV output already ends with a newline
    if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    Ok(())
}

/// A stderr spinner shown while waiting on the server.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn report_success(message: &str) {
    ceprintln!("<g>✓</g> {}", message);
}

pub fn report_warning(message: &str) {
    ceprintln!("<y>!</y> {}", message);
}

pub fn report_failure(message: &str) {
    ceprintln!("<r>✗</r> {}", message);
}
