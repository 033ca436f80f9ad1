// Program entry point and CLI processing
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

pub mod command;
pub mod compiler;
pub mod delimited_parser;
pub mod error_handling;
pub mod fast_regex;
pub mod multi_io;
pub mod named_writer;
pub mod processor;
pub mod script_char_provider;
pub mod script_line_provider;
pub mod substitute;

use crate::command::{DEFAULT_LINE_LENGTH, ProcessingContext};
use crate::compiler::compile;
use crate::processor::process_all_files;
use crate::script_line_provider::ScriptValue;
use clap::{Arg, ArgAction, ArgMatches, Command, arg};
use std::path::PathBuf;
use uucore::error::{UResult, UUsageError};
use uucore::format_usage;

const ABOUT: &str = "Line-oriented stream editor for filtering and transforming text";
const USAGE: &str = "stred [OPTION]... [script] [file]...";
const AFTER_HELP: &str = "The b, t, and : commands are an extension of the \
    basic command set; they follow the POSIX semantics.";

#[uucore::main]
pub fn uumain(args: impl uucore::Args) -> UResult<()> {
    let matches = uu_app().try_get_matches_from(args)?;
    let (scripts, files) = get_scripts_files(&matches)?;
    let mut processing_context = build_context(&matches);

    let mut script = compile(scripts, &mut processing_context)?;
    process_all_files(&mut script, files, &mut processing_context)
}

pub fn uu_app() -> Command {
    Command::new(uucore::util_name())
        .about(ABOUT)
        .override_usage(format_usage(USAGE))
        .after_help(AFTER_HELP)
        .infer_long_args(true)
        .args([
            arg!([script] "Script to execute if not otherwise provided."),
            Arg::new("file")
                .help("Input files")
                .value_parser(clap::value_parser!(PathBuf))
                .num_args(0..),
            arg!(-e --expression <SCRIPT> "Add script to executed commands.")
                .action(ArgAction::Append),
            // Access with .get_many::<PathBuf>("script-file")
            Arg::new("script-file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Add the contents of the script file to executed commands.")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Append),
            arg!(-n --quiet "Suppress automatic printing of pattern space.").aliases(["silent"]),
            Arg::new("regexp-extended")
                .short('E')
                .long("regexp-extended")
                .short_alias('r')
                .help("Use extended regular expressions.")
                .action(ArgAction::SetTrue),
            // Access with .get_one::<usize>("line-length")
            arg!(-l --"line-length" <NUM> "Specify the 'l' command line-wrap length.")
                .value_parser(clap::value_parser!(usize)),
            arg!(-u --unbuffered "Flush output buffers at the end of every cycle."),
        ])
}

// Iterate through script and file arguments specified in matches and
// return vectors of all scripts and input files in the specified order.
// If no script is specified fail with "missing script" error.
fn get_scripts_files(matches: &ArgMatches) -> UResult<(Vec<ScriptValue>, Vec<PathBuf>)> {
    let mut indexed_scripts: Vec<(usize, ScriptValue)> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();

    if matches.contains_id("expression") || matches.contains_id("script-file") {
        // With -e or -f the first positional argument is an input file.
        if let Some(val) = matches.get_one::<String>("script") {
            files.push(PathBuf::from(val));
        }
    } else if let Some(val) = matches.get_one::<String>("script") {
        indexed_scripts.push((0, ScriptValue::StringVal(val.to_owned())));
    } else {
        return Err(UUsageError::new(1, "missing script"));
    }

    if let Some(indices) = matches.indices_of("expression") {
        for (idx, val) in indices.zip(matches.get_many::<String>("expression").unwrap_or_default())
        {
            indexed_scripts.push((idx, ScriptValue::StringVal(val.to_owned())));
        }
    }

    if let Some(indices) = matches.indices_of("script-file") {
        for (idx, val) in indices.zip(
            matches
                .get_many::<PathBuf>("script-file")
                .unwrap_or_default(),
        ) {
            indexed_scripts.push((idx, ScriptValue::PathVal(val.to_owned())));
        }
    }

    // Pieces are compiled in the order they appear on the command line.
    indexed_scripts.sort_by_key(|(idx, _)| *idx);
    let scripts = indexed_scripts
        .into_iter()
        .map(|(_, value)| value)
        .collect();

    files.extend(
        matches
            .get_many::<PathBuf>("file")
            .unwrap_or_default()
            .cloned(),
    );
    if files.is_empty() {
        files.push(PathBuf::from("-"));
    }

    Ok((scripts, files))
}

// Return the processing context set up by the command-line flags.
fn build_context(matches: &ArgMatches) -> ProcessingContext {
    ProcessingContext {
        quiet: matches.get_flag("quiet"),
        regex_extended: matches.get_flag("regexp-extended"),
        unbuffered: matches.get_flag("unbuffered"),
        length: matches
            .get_one::<usize>("line-length")
            .copied()
            .unwrap_or(DEFAULT_LINE_LENGTH),
        ..Default::default()
    }
}
