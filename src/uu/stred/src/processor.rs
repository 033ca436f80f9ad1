// Execution of compiled scripts on the input lines
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::command::{
    Action, Address, AppendElement, Command, ProcessingContext, Script, StringSpace,
};
use crate::error_handling::{ScriptLocation, runtime_error};
use crate::fast_regex::Regex;
use crate::multi_io::{InputFiles, LineSource, OutputBuffer};
use crate::substitute::substitute;

use memchr::memchr;
use std::fmt::Write as _;
use std::io;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use uucore::error::UResult;

/// How the execution of the script on a pattern space ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    EndCycle, // Ran past the last command
    Delete,   // d, D without a newline, c: no auto-print
    Restart,  // D: rerun on the remaining pattern space
    Quit,     // q, or n and N at the end of input
}

/// Process all input files with the compiled script, writing to the
/// standard output.
pub fn process_all_files(
    script: &mut Script,
    files: Vec<PathBuf>,
    context: &mut ProcessingContext,
) -> UResult<()> {
    let mut input = InputFiles::from_paths(files);
    let mut output = OutputBuffer::new(Box::new(io::stdout()), context.unbuffered);

    let result = process(script, &mut input, &mut output, context);
    output.flush()?;
    context.writers.flush_all()?;
    result
}

/// Run the script's cycle on every line of the input.
pub fn process(
    script: &mut Script,
    input: &mut dyn LineSource,
    output: &mut OutputBuffer,
    context: &mut ProcessingContext,
) -> UResult<()> {
    let mut pattern = StringSpace::default();
    let mut restart = false;

    loop {
        if !restart {
            match read_pattern_space(input, context)? {
                Some(space) => pattern = space,
                None => break,
            }
        }

        let flow = execute(script, &mut pattern, input, output, context)?;
        restart = flow == Flow::Restart;

        if matches!(flow, Flow::EndCycle | Flow::Quit) && !context.quiet {
            output.write_space(&pattern)?;
        }
        flush_appends(output, context)?;
        if output.is_unbuffered() {
            output.flush()?;
            context.writers.flush_all()?;
        }

        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Read the next input line, updating the line state.
/// Return None at the end of input.
fn read_pattern_space(
    input: &mut dyn LineSource,
    context: &mut ProcessingContext,
) -> UResult<Option<StringSpace>> {
    let Some((content, has_newline)) = input.next_line()? else {
        return Ok(None);
    };

    context.line_number += 1;
    context.last_line = input.is_last_line()?;
    context.substitution_made = false;
    Ok(Some(StringSpace {
        content,
        has_newline,
    }))
}

/// Output the text and file contents queued by a and r.
fn flush_appends(output: &mut OutputBuffer, context: &mut ProcessingContext) -> UResult<()> {
    for element in context.append_elements.drain(..) {
        match element {
            AppendElement::Text(text) => {
                output.write_str(&text)?;
                output.write_str("\n")?;
            }
            AppendElement::Path(path) => output.copy_file(&path)?,
        }
    }
    Ok(())
}

/// Return the RE to apply, which is the specified one or, if that is
/// empty, the last one applied.
fn last_regex(
    regex: &Option<Rc<Regex>>,
    context: &mut ProcessingContext,
    location: &ScriptLocation,
) -> UResult<Rc<Regex>> {
    match regex {
        Some(re) => {
            context.saved_regex = Some(Rc::clone(re));
            Ok(Rc::clone(re))
        }
        None => match &context.saved_regex {
            Some(re) => Ok(Rc::clone(re)),
            None => runtime_error(location, "no previous regular expression"),
        },
    }
}

/// Return true if the address selects the pattern space.
fn match_address(
    addr: &Address,
    pattern: &StringSpace,
    context: &mut ProcessingContext,
    location: &ScriptLocation,
) -> UResult<bool> {
    match addr {
        Address::Line(n) => Ok(context.line_number == *n),
        Address::Last => Ok(context.last_line),
        Address::Re(re) => last_regex(re, context, location)?.is_match(&pattern.content),
    }
}

/// Return true if the command's addresses select the pattern space,
/// updating the state of its range.
fn applies(
    cmd: &mut Command,
    pattern: &StringSpace,
    context: &mut ProcessingContext,
) -> UResult<bool> {
    let selected = match (&cmd.addr1, &cmd.addr2) {
        (None, _) => true,
        (Some(addr1), None) => match_address(addr1, pattern, context, &cmd.location)?,
        (Some(addr1), Some(addr2)) => {
            if cmd.start_line.is_some() {
                let closes = match addr2 {
                    Address::Line(n) => context.line_number >= *n,
                    _ => match_address(addr2, pattern, context, &cmd.location)?,
                };
                if closes {
                    cmd.start_line = None;
                }
                true
            } else if match_address(addr1, pattern, context, &cmd.location)? {
                // A range whose end is already reached covers one line.
                let closes = match addr2 {
                    Address::Line(n) => *n <= context.line_number,
                    _ => match_address(addr2, pattern, context, &cmd.location)?,
                };
                if !closes {
                    cmd.start_line = Some(context.line_number);
                }
                true
            } else {
                false
            }
        }
    };
    Ok(selected != cmd.non_select)
}

/// Write the text followed by a newline.
fn write_text(output: &mut OutputBuffer, text: &str) -> UResult<()> {
    output.write_str(text)?;
    output.write_str("\n")
}

/// Return the visually unambiguous form of a character for `l`.
fn unambiguous_char(c: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\x07' => "\\a".to_string(),
        '\x08' => "\\b".to_string(),
        '\x0c' => "\\f".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\x0b' => "\\v".to_string(),
        c if c.is_control() => {
            let mut buf = [0; 4];
            c.encode_utf8(&mut buf)
                .bytes()
                .fold(String::new(), |mut octal, b| {
                    let _ = write!(octal, "\\{b:03o}");
                    octal
                })
        }
        c => c.to_string(),
    }
}

/// Render the text for `l`, folding an output line with a `\` once it
/// holds width columns and more follow.
/// Bytes that are not valid UTF-8 appear in octal.
/// A width of 0 or 1 disables folding.
fn list_text(text: &[u8], width: usize) -> String {
    let mut result = String::new();
    let mut column = 0;
    let mut push_unit = |unit: &str| {
        if unit == "\n" {
            result.push_str("$\n");
            column = 0;
            return;
        }

        let unit_width = unit.chars().count();
        if width > 1 && column + unit_width > width {
            result.push_str("\\\n");
            column = 0;
        }
        result.push_str(unit);
        column += unit_width;
    };

    for chunk in text.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '\n' => push_unit("\n"),
                c => push_unit(&unambiguous_char(c)),
            }
        }
        for b in chunk.invalid() {
            push_unit(&format!("\\{b:03o}"));
        }
    }
    result.push_str("$\n");
    result
}

/// Execute the script on the pattern space, returning how the
/// execution ended.
fn execute(
    script: &mut Script,
    pattern: &mut StringSpace,
    input: &mut dyn LineSource,
    output: &mut OutputBuffer,
    context: &mut ProcessingContext,
) -> UResult<Flow> {
    let end_of_script = script.commands.len();
    let mut pc = 0;

    while pc < end_of_script {
        let cmd = &mut script.commands[pc];
        pc += 1;

        if !applies(cmd, pattern, context)? {
            if let Action::Block(end) = cmd.action {
                pc = end;
            }
            continue;
        }

        match &cmd.action {
            Action::Block(_) | Action::Comment | Action::Label(_) => {}

            Action::Append(text) => {
                context
                    .append_elements
                    .push(AppendElement::Text(text.clone()));
            }

            Action::Branch(jump) => pc = jump.target.unwrap_or(end_of_script),

            Action::Change(text) => {
                // Within a range only its last line is replaced.
                if cmd.addr2.is_none() || cmd.non_select || cmd.start_line.is_none() {
                    write_text(output, text)?;
                }
                return Ok(Flow::Delete);
            }

            Action::Delete => return Ok(Flow::Delete),

            Action::DeleteFirstLine => match memchr(b'\n', &pattern.content) {
                Some(pos) => {
                    pattern.content.drain(..=pos);
                    return Ok(Flow::Restart);
                }
                None => return Ok(Flow::Delete),
            },

            Action::ReplaceWithHold => pattern.content.clone_from(&context.hold.content),
            Action::AppendHold => pattern.append_line(&context.hold.content),
            Action::HoldPattern => context.hold.content.clone_from(&pattern.content),
            Action::AppendToHold => context.hold.append_line(&pattern.content),
            Action::Exchange => mem::swap(&mut pattern.content, &mut context.hold.content),

            Action::Insert(text) => write_text(output, text)?,

            Action::List => output.write_str(&list_text(&pattern.content, context.length))?,

            Action::Next => {
                if context.last_line {
                    return Ok(Flow::Quit);
                }
                if !context.quiet {
                    output.write_space(pattern)?;
                }
                flush_appends(output, context)?;
                match read_pattern_space(input, context)? {
                    Some(space) => *pattern = space,
                    None => return Ok(Flow::Quit),
                }
            }

            Action::AppendNext => {
                if context.last_line {
                    return Ok(Flow::Quit);
                }
                flush_appends(output, context)?;
                match read_pattern_space(input, context)? {
                    Some(space) => {
                        pattern.append_line(&space.content);
                        pattern.has_newline = space.has_newline;
                    }
                    None => return Ok(Flow::Quit),
                }
            }

            Action::Print => output.write_space(pattern)?,

            Action::PrintFirstLine => {
                let end = memchr(b'\n', &pattern.content).unwrap_or(pattern.content.len());
                output.write_bytes(&pattern.content[..end])?;
                output.write_str("\n")?;
            }

            Action::Quit => return Ok(Flow::Quit),

            Action::ReadFile(path) => {
                context
                    .append_elements
                    .push(AppendElement::Path(path.clone()));
            }

            Action::Substitute(subst) => {
                let regex = last_regex(&subst.regex, context, &cmd.location)?;
                if substitute(&mut pattern.content, &regex, subst, &cmd.location)? {
                    context.substitution_made = true;
                    if subst.print_flag {
                        output.write_space(pattern)?;
                    }
                    if let Some(path) = &subst.write_file {
                        context
                            .writers
                            .write_line(path, &cmd.location, &pattern.content)?;
                    }
                }
            }

            Action::Test(jump) => {
                if context.substitution_made {
                    context.substitution_made = false;
                    pc = jump.target.unwrap_or(end_of_script);
                }
            }

            Action::Transliterate(trans) => pattern.content = trans.apply(&pattern.content),

            Action::WriteFile(path) => {
                context
                    .writers
                    .write_line(path, &cmd.location, &pattern.content)?;
            }

            Action::LineNumber => output.write_str(&format!("{}\n", context.line_number))?,
        }
    }
    Ok(Flow::EndCycle)
}
