// Compile the scripts into the internal representation of commands
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::command::{
    Action, Address, Command, Jump, ProcessingContext, ReplacementPart, ReplacementTemplate,
    Script, Substitution, Transliteration,
};
use crate::delimited_parser::{
    parse_char_escape, parse_regex, parse_transliteration, scan_delimiter,
};
use crate::error_handling::{FATAL_EXIT_CODE, compilation_error, semantic_error};
use crate::fast_regex::Regex;
use crate::script_char_provider::ScriptCharProvider;
use crate::script_line_provider::{ScriptLineProvider, ScriptValue};

use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use uucore::error::{UResult, USimpleError};

// Handling required after processing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandHandling {
    GetNext,  // Get next command and process that: !
    Return,   // Return from the sequence parser: }
    Continue, // Continue sequence parsing: most commands
    Block,    // Parse the block's commands that follow: {
}

/// The type of functions that compile individual commands
type CommandHandler = fn(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    context: &mut ProcessingContext,
) -> UResult<CommandHandling>;

// Command specification
#[derive(Debug, Clone, Copy)]
struct CommandSpec {
    n_addr: usize,           // Number of supported addresses
    handler: CommandHandler, // Argument-specific command compilation handler
}

/// Compile the scripts into an executable data structure.
pub fn compile(scripts: Vec<ScriptValue>, context: &mut ProcessingContext) -> UResult<Script> {
    let mut lines = ScriptLineProvider::new(scripts);

    let mut empty_line = ScriptCharProvider::new("");
    let mut commands = Vec::new();
    compile_sequence(&mut lines, &mut empty_line, &mut commands, context)?;

    // Comment-out the following to show the compiled script.
    #[cfg(any())]
    dbg!(&commands);

    if context.parsed_block_nesting > 0 {
        return Err(USimpleError::new(FATAL_EXIT_CODE, "unmatched `{'"));
    }

    resolve_branch_targets(&mut commands)?;
    Ok(Script { commands })
}

/// Compile a single script string.
pub fn compile_str(script: &str, context: &mut ProcessingContext) -> UResult<Script> {
    compile(vec![ScriptValue::StringVal(script.to_string())], context)
}

/// Set the target of every labeled b and t command to the index of
/// the corresponding label command.
/// Raise an error on duplicate or undefined labels.
fn resolve_branch_targets(commands: &mut [Command]) -> UResult<()> {
    let mut label_to_index = HashMap::new();
    for (index, cmd) in commands.iter().enumerate() {
        if let Action::Label(label) = &cmd.action
            && label_to_index.insert(label.clone(), index).is_some()
        {
            return semantic_error(&cmd.location, format!("duplicate label `{label}'"));
        }
    }

    for cmd in commands.iter_mut() {
        if let Action::Branch(jump) | Action::Test(jump) = &mut cmd.action
            && let Some(label) = &jump.label
        {
            match label_to_index.get(label) {
                Some(&index) => jump.target = Some(index),
                None => {
                    return semantic_error(&cmd.location, format!("undefined label `{label}'"));
                }
            }
        }
    }
    Ok(())
}

/// Compile provided scripts into a sequence of commands appended to
/// `commands`, returning at the end of the script or of a block.
fn compile_sequence(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    commands: &mut Vec<Command>,
    context: &mut ProcessingContext,
) -> UResult<()> {
    loop {
        line.eat_spaces();

        // According to POSIX: "If the first two characters in the script are
        // "#n", the default output shall be suppressed".
        if lines.at_script_start()
            && line.get_pos() == 0
            && !line.eol()
            && line.current() == '#'
            && line.take_rest() == "#n"
        {
            context.quiet = true;
        }

        if line.eol() || line.current() == '#' {
            match lines.next_line()? {
                None => {
                    return Ok(());
                }
                Some(line_string) => {
                    *line = ScriptCharProvider::new(&line_string);
                }
            }
            continue;
        } else if line.current() == ';' {
            line.advance();
            continue;
        }

        let mut cmd = Command::at_position(lines, line);
        let n_addr = compile_address_range(lines, line, &mut cmd, context)?;
        line.eat_spaces();
        let mut cmd_spec = get_verified_cmd_spec(lines, line, n_addr)?;

        // Compile the command according to its specification.
        cmd.code = line.current();
        let mut handling = (cmd_spec.handler)(lines, line, &mut cmd, context)?;
        if handling == CommandHandling::GetNext {
            cmd_spec = get_verified_cmd_spec(lines, line, n_addr)?;
            cmd.code = line.current();
            handling = (cmd_spec.handler)(lines, line, &mut cmd, context)?;
        }

        match handling {
            CommandHandling::Return => return Ok(()),
            CommandHandling::Block => {
                let index = commands.len();
                commands.push(cmd);
                compile_sequence(lines, line, commands, context)?;
                commands[index].action = Action::Block(commands.len());
            }
            CommandHandling::Continue | CommandHandling::GetNext => commands.push(cmd),
        }
    }
}

/// Return true if c can start an address.
/// Any character that isn't a command code or a separator can delimit
/// a context address.
fn is_address_char(lines: &ScriptLineProvider, line: &ScriptCharProvider, c: char) -> bool {
    match c {
        '0'..='9' | '$' | '\\' => true,
        ';' | ',' => false,
        c if c.is_whitespace() => false,
        c => get_cmd_spec(lines, line, c).is_err(),
    }
}

/// Compile a command's optional address range into cmd.
/// Return the number of addresses encountered.
fn compile_address_range(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    context: &ProcessingContext,
) -> UResult<usize> {
    let mut n_addr = 0;

    line.eat_spaces();
    if line.eol() || !is_address_char(lines, line, line.current()) {
        return Ok(n_addr);
    }
    cmd.addr1 = Some(compile_address(lines, line, context)?);
    n_addr += 1;

    line.eat_spaces();
    if !line.eol() && line.current() == ',' {
        line.advance();
        line.eat_spaces();
        if line.eol() || !is_address_char(lines, line, line.current()) {
            return compilation_error(lines, line, "unexpected `,'");
        }
        cmd.addr2 = Some(compile_address(lines, line, context)?);
        n_addr += 1;
    }

    Ok(n_addr)
}

/// Read the line's remaining characters as a file path and return it.
fn read_file_path(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<PathBuf> {
    line.advance(); // Skip the command/w character
    line.eat_spaces(); // Skip any leading whitespace

    let path = line.take_rest();
    if path.is_empty() {
        compilation_error(lines, line, "missing file path")
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Compile and return a single range address specification.
fn compile_address(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    context: &ProcessingContext,
) -> UResult<Address> {
    if line.eol() {
        return compilation_error(lines, line, "expected context address");
    }

    match line.current() {
        '$' => {
            line.advance();
            Ok(Address::Last)
        }
        c if c.is_ascii_digit() => {
            let number = parse_number(lines, line)?;
            if number == 0 {
                return compilation_error(lines, line, "invalid usage of line address 0");
            }
            Ok(Address::Line(number))
        }
        _ => {
            // Regular expression
            if line.current() == '\\' {
                // The next character is an arbitrary delimiter
                line.advance();
            }
            let delimiter = scan_delimiter(lines, line)?;
            let re = parse_regex(lines, line, delimiter)?;
            Ok(Address::Re(compile_regex(lines, line, &re, context)?))
        }
    }
}

/// Parse and return the decimal number at the current line position.
/// Advance the line to first non-digit or EOL.
fn parse_number(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<usize> {
    let mut num_str = String::new();

    while !line.eol() && line.current().is_ascii_digit() {
        num_str.push(line.current());
        line.advance();
    }

    if num_str.is_empty() {
        return compilation_error(lines, line, "number expected");
    }

    match num_str.parse::<usize>() {
        Ok(number) => Ok(number),
        Err(_) => compilation_error(lines, line, format!("invalid number '{num_str}'")),
    }
}

/// Parse the end of a command, failing with an error on extra characters.
/// A following `}` or comment is left for the sequence parser.
fn parse_command_ending(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &Command,
) -> UResult<()> {
    line.eat_spaces();
    if line.eol() {
        return Ok(());
    }

    match line.current() {
        ';' => {
            line.advance();
            Ok(())
        }
        '}' | '#' => Ok(()),
        _ => compilation_error(
            lines,
            line,
            format!("extra characters at the end of the {} command", cmd.code),
        ),
    }
}

/// Copy the bracket expression starting at chars[start] to result,
/// escaping the characters that are special only inside Rust RE classes.
/// Return the index past the expression.
fn copy_bracket_expression(chars: &[char], start: usize, result: &mut String) -> usize {
    let mut i = start + 1;
    result.push('[');

    if chars.get(i) == Some(&'^') {
        result.push('^');
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        result.push_str(r"\]");
        i += 1;
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            ']' => {
                result.push(']');
                return i + 1;
            }
            '[' if matches!(chars.get(i + 1), Some(':' | '.' | '=')) => {
                // [:alpha:], [.x.], [=e=]
                let marker = chars[i + 1];
                result.push('[');
                result.push(marker);
                i += 2;
                while i < chars.len() {
                    result.push(chars[i]);
                    if chars[i] == marker && chars.get(i + 1) == Some(&']') {
                        result.push(']');
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            // In POSIX classes a backslash is an ordinary character.
            '\\' | '[' | '&' | '~' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
        i += 1;
    }

    // Unterminated; left for the RE compiler to report.
    i
}

/// Convert a BRE pattern to an equivalent pattern in the ERE-like
/// syntax of the regex crates.
/// - Replaces `\(`, `\)`, `\{`, `\}` with `(`, `)`, `{`, `}`.
/// - Replaces `\+`, `\?`, `\|` with `+`, `?`, `|`.
/// - Puts single-digit back-references in non-capturing groups.
/// - Escapes ERE-only metacharacters: `+ ? { } | ( )`.
/// - Escapes `*`, `^`, `$` where they are literal in a BRE.
fn bre_to_ere(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut result = String::with_capacity(pattern.len());

    // True at the start of the pattern, of a group, or of an alternative,
    // where `^` is an anchor and `*` is literal.
    let mut at_start = true;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut next_at_start = false;
        match c {
            '\\' => match chars.get(i + 1) {
                Some(&next @ ('(' | '|')) => {
                    result.push(next);
                    next_at_start = true;
                    i += 1;
                }
                Some(&next @ (')' | '{' | '}' | '+' | '?')) => {
                    result.push(next);
                    i += 1;
                }
                Some(&v) if v.is_ascii_digit() => {
                    // In BREs back-references are single-digit, so \11
                    // is group 1 followed by '1'.
                    result.push_str(&format!(r"(?:\{v})"));
                    i += 1;
                }
                Some(&next) => {
                    // Preserve other escaped characters.
                    result.push('\\');
                    result.push(next);
                    i += 1;
                }
                None => {
                    // Trailing backslash; keep it.
                    result.push('\\');
                }
            },
            '[' => {
                i = copy_bracket_expression(&chars, i, &mut result);
                at_start = false;
                continue;
            }
            '*' if at_start => result.push_str(r"\*"),
            '^' if at_start => {
                result.push('^');
                next_at_start = true;
            }
            '^' => result.push_str(r"\^"),
            '$' if i + 1 == chars.len()
                || (chars[i + 1] == '\\' && matches!(chars.get(i + 2), Some(')' | '|'))) =>
            {
                result.push('$');
            }
            '$' => result.push_str(r"\$"),
            '+' | '?' | '{' | '}' | '|' | '(' | ')' => {
                // Escape unsupported ERE metacharacters.
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
        at_start = next_at_start;
        i += 1;
    }

    result
}

/// Compile the provided regular expression string into a corresponding engine.
/// An empty pattern results in None, which means that the last RE employed
/// at runtime will be used.
fn compile_regex(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    pattern: &str,
    context: &ProcessingContext,
) -> UResult<Option<Rc<Regex>>> {
    if pattern.is_empty() {
        return Ok(None);
    }

    // Convert basic to extended regular expression if needed.
    let pattern = if context.regex_extended {
        pattern.to_string()
    } else {
        bre_to_ere(pattern)
    };

    match Regex::new(&pattern) {
        Ok(compiled) => Ok(Some(Rc::new(compiled))),
        Err(e) => compilation_error(lines, line, format!("invalid regex '{pattern}': {e}")),
    }
}

/// Compile the replacement part of a substitution, which follows the
/// already consumed pattern delimiter.
/// On return the line is past the closing delimiter.
fn compile_replacement(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    delimiter: char,
) -> UResult<ReplacementTemplate> {
    let mut parts = Vec::new();
    let mut literal = String::new();

    loop {
        if line.eol() {
            return compilation_error(lines, line, "unterminated `s' command");
        }

        match line.current() {
            c if c == delimiter => {
                line.advance(); // skip closing delimiter
                if !literal.is_empty() {
                    parts.push(ReplacementPart::Literal(literal));
                }
                return Ok(ReplacementTemplate::new(parts));
            }

            '\\' => {
                line.advance();

                // An escaped newline is part of the replacement.
                if line.eol() {
                    match lines.next_line()? {
                        Some(next_line_string) => {
                            literal.push('\n');
                            *line = ScriptCharProvider::new(&next_line_string);
                            continue;
                        }
                        None => {
                            return compilation_error(lines, line, "unterminated `s' command");
                        }
                    }
                }

                match line.current() {
                    // Literal delimiter, \ and &
                    c if c == delimiter || c == '\\' || c == '&' => {
                        literal.push(c);
                        line.advance();
                    }

                    // \0 - \9
                    c @ '0'..='9' => {
                        if !literal.is_empty() {
                            parts.push(ReplacementPart::Literal(mem::take(&mut literal)));
                        }
                        match c.to_digit(10) {
                            Some(0) | None => parts.push(ReplacementPart::WholeMatch),
                            Some(n) => parts.push(ReplacementPart::Group(n)),
                        }
                        line.advance();
                    }

                    // Other escape sequences; unknown ones stand for the character.
                    _ => match parse_char_escape(line) {
                        Some(decoded) => literal.push(decoded),
                        None => {
                            literal.push(line.current());
                            line.advance();
                        }
                    },
                }
            }

            '&' => {
                if !literal.is_empty() {
                    parts.push(ReplacementPart::Literal(mem::take(&mut literal)));
                }
                parts.push(ReplacementPart::WholeMatch);
                line.advance();
            }

            c => {
                literal.push(c);
                line.advance();
            }
        }
    }
}

/// Parse the substitution command's optional flags.
fn compile_subst_flags(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    subst: &mut Substitution,
) -> UResult<()> {
    let mut seen_number = false;

    loop {
        if line.eol() {
            break;
        }

        match line.current() {
            'g' => {
                if subst.global {
                    return compilation_error(lines, line, "multiple `g' options to `s' command");
                }
                subst.global = true;
                line.advance();
            }

            'p' => {
                if subst.print_flag {
                    return compilation_error(lines, line, "multiple `p' options to `s' command");
                }
                subst.print_flag = true;
                line.advance();
            }

            '0'..='9' => {
                if seen_number {
                    return compilation_error(
                        lines,
                        line,
                        "multiple number options to `s' command",
                    );
                }
                let number = parse_number(lines, line)?;
                if number == 0 {
                    return compilation_error(
                        lines,
                        line,
                        "number option to `s' command may not be zero",
                    );
                }
                subst.occurrence = number;
                seen_number = true;
            }

            'w' => {
                subst.write_file = Some(read_file_path(lines, line)?);
                return Ok(()); // 'w' is the last flag allowed
            }

            ';' | '}' | '#' => break,
            c if c.is_whitespace() => break,

            _ => return compilation_error(lines, line, "unknown option to `s'"),
        }
    }

    Ok(())
}

// Handles s
fn compile_subst_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.advance(); // move past 's'

    let delimiter = scan_delimiter(lines, line)?;
    let pattern = parse_regex(lines, line, delimiter)?;

    let mut subst = Box::new(Substitution::default());
    subst.replacement = compile_replacement(lines, line, delimiter)?;
    compile_subst_flags(lines, line, &mut subst)?;
    subst.regex = compile_regex(lines, line, &pattern, context)?;

    // Catch invalid group references at compile time, if possible.
    if let Some(regex) = &subst.regex
        && subst.replacement.max_group_number > regex.captures_len() - 1
    {
        return compilation_error(
            lines,
            line,
            format!(
                "invalid reference \\{} on `s' command's RHS",
                subst.replacement.max_group_number
            ),
        );
    }

    cmd.action = Action::Substitute(subst);

    parse_command_ending(lines, line, cmd)?;
    Ok(CommandHandling::Continue)
}

// Handles y
fn compile_trans_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.advance(); // move past 'y'

    let delimiter = scan_delimiter(lines, line)?;
    let source = parse_transliteration(lines, line, delimiter)?;
    let target = parse_transliteration(lines, line, delimiter)?;
    if source.chars().count() != target.chars().count() {
        return compilation_error(
            lines,
            line,
            "strings for `y' command are different lengths",
        );
    }

    let transliteration = Box::new(Transliteration::from_strings(&source, &target));
    cmd.action = Action::Transliterate(transliteration);

    parse_command_ending(lines, line, cmd)?;
    Ok(CommandHandling::Continue)
}

// Handles }
fn compile_end_group_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    if context.parsed_block_nesting == 0 {
        return compilation_error(lines, line, "unexpected `}'");
    }
    context.parsed_block_nesting -= 1;
    line.advance();
    parse_command_ending(lines, line, cmd)?;
    Ok(CommandHandling::Return)
}

// Handles !
fn compile_negation_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    if cmd.non_select {
        return compilation_error(lines, line, "multiple `!'s");
    }
    line.advance();
    line.eat_spaces();
    cmd.non_select = true;
    Ok(CommandHandling::GetNext)
}

/// Compile a command that doesn't take any arguments
// Handles d D g G h H l n N p P q x =
fn compile_empty_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    cmd.action = match cmd.code {
        'd' => Action::Delete,
        'D' => Action::DeleteFirstLine,
        'g' => Action::ReplaceWithHold,
        'G' => Action::AppendHold,
        'h' => Action::HoldPattern,
        'H' => Action::AppendToHold,
        'l' => Action::List,
        'n' => Action::Next,
        'N' => Action::AppendNext,
        'p' => Action::Print,
        'P' => Action::PrintFirstLine,
        'q' => Action::Quit,
        'x' => Action::Exchange,
        '=' => Action::LineNumber,
        _ => unreachable!("invalid argument-less command"),
    };

    line.advance(); // Skip the command character
    parse_command_ending(lines, line, cmd)?;
    Ok(CommandHandling::Continue)
}

// Handles #
fn compile_comment_command(
    _lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.take_rest();
    cmd.action = Action::Comment;
    Ok(CommandHandling::Continue)
}

// Handles r
fn compile_read_file_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    let path = read_file_path(lines, line)?;
    cmd.action = Action::ReadFile(path);
    Ok(CommandHandling::Continue)
}

// Handles w
fn compile_write_file_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    let path = read_file_path(lines, line)?;
    cmd.action = Action::WriteFile(path);
    Ok(CommandHandling::Continue)
}

// Handles {
fn compile_block_command(
    _lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    _cmd: &mut Command,
    context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.advance(); // move past '{'
    context.parsed_block_nesting += 1;
    Ok(CommandHandling::Block)
}

// Handles b, t, :
// The label extends to the end of the line, less trailing blanks.
fn compile_label_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character
    line.eat_spaces(); // Skip any leading whitespace

    let label = line.take_rest().trim_end().to_string();
    let jump = || Jump {
        label: (!label.is_empty()).then(|| label.clone()),
        target: None,
    };

    cmd.action = match cmd.code {
        ':' if label.is_empty() => {
            return compilation_error(lines, line, "\":\" lacks a label");
        }
        ':' => Action::Label(label.clone()),
        'b' => Action::Branch(jump()),
        't' => Action::Test(jump()),
        _ => unreachable!("invalid label command"),
    };
    Ok(CommandHandling::Continue)
}

/// Compile commands that take text as an argument.
// Handles a, c, i
// According to POSIX, these commands expect \ followed by text,
// which can also start on the next line.
fn compile_text_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _context: &mut ProcessingContext,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character.

    if line.eol() || line.current() != '\\' {
        return compilation_error(lines, line, "expected \\ after `a', `c' or `i'");
    }
    line.advance(); // Skip \.
    line.eat_spaces();

    // Text starting on the following line
    if line.eol() {
        match lines.next_line()? {
            Some(line_string) => *line = ScriptCharProvider::new(&line_string),
            None => return compilation_error(lines, line, "incomplete command"),
        }
    }

    // Gather the text.  Stop on a non-escaped newline.
    let mut text = String::new();
    while !line.eol() {
        if line.current() != '\\' {
            text.push(line.current());
            line.advance();
            continue;
        }

        line.advance();
        if line.eol() {
            // Escaped newline: continue with the next line.
            if let Some(line_string) = lines.next_line()? {
                text.push('\n');
                *line = ScriptCharProvider::new(&line_string);
            }
            continue;
        }

        match parse_char_escape(line) {
            Some(decoded) => text.push(decoded),
            None => {
                // Invalid escapes result in the escaped character.
                text.push(line.current());
                line.advance();
            }
        }
    }

    cmd.action = match cmd.code {
        'a' => Action::Append(text),
        'i' => Action::Insert(text),
        'c' => Action::Change(text),
        _ => unreachable!("invalid text command"),
    };
    Ok(CommandHandling::Continue)
}

// Return the specification for the command letter at the current line position
// checking for diverse errors.
fn get_verified_cmd_spec(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    n_addr: usize,
) -> UResult<CommandSpec> {
    if line.eol() {
        return compilation_error(lines, line, "command expected");
    }

    let ch = line.current();
    let cmd_spec = get_cmd_spec(lines, line, ch)?;

    if n_addr > cmd_spec.n_addr {
        return compilation_error(
            lines,
            line,
            format!(
                "command {} expects up to {} address(es), found {}",
                ch, cmd_spec.n_addr, n_addr
            ),
        );
    }

    Ok(cmd_spec)
}

// Look up a command addresses and handler by its command code.
fn get_cmd_spec(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    cmd_code: char,
) -> UResult<CommandSpec> {
    match cmd_code {
        '!' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_negation_command,
        }),
        '#' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_comment_command,
        }),
        ':' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_label_command,
        }),
        '{' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_block_command,
        }),
        '}' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_end_group_command,
        }),
        'a' | 'i' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_text_command,
        }),
        'b' | 't' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_label_command,
        }),
        'c' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_text_command,
        }),
        'd' | 'D' | 'g' | 'G' | 'h' | 'H' | 'l' | 'n' | 'N' | 'p' | 'P' | 'x' | '=' => {
            Ok(CommandSpec {
                n_addr: 2,
                handler: compile_empty_command,
            })
        }
        'q' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_empty_command,
        }),
        'r' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_read_file_command,
        }),
        's' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_subst_command,
        }),
        'w' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_write_file_command,
        }),
        'y' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_trans_command,
        }),
        _ => compilation_error(lines, line, format!("invalid command code `{cmd_code}'")),
    }
}
