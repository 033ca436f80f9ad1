// Location-aware compilation and processing errors
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::script_char_provider::ScriptCharProvider;
use crate::script_line_provider::ScriptLineProvider;

use std::fmt;
use uucore::error::{UResult, USimpleError};

/// Exit code of all fatal errors, at compile time and at run time.
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// The place in the script where a command was defined
pub struct ScriptLocation {
    pub input_name: String,
    pub line_number: usize,
    pub column_number: usize,
}

impl ScriptLocation {
    /// Capture the current position of the script providers.
    pub fn at_position(lines: &ScriptLineProvider, line: &ScriptCharProvider) -> Self {
        ScriptLocation {
            input_name: lines.get_input_name().to_string(),
            line_number: lines.get_line_number(),
            column_number: line.get_pos() + 1,
        }
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.input_name, self.line_number, self.column_number
        )
    }
}

/// Fail with msg as a compile error at the provider location.
pub fn compilation_error<T>(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    msg: impl ToString,
) -> UResult<T> {
    let location = ScriptLocation::at_position(lines, line);
    Err(USimpleError::new(
        FATAL_EXIT_CODE,
        format!("{location}: error: {}", msg.to_string()),
    ))
}

/// Fail with msg as an error detected after parsing, e.g. while
/// resolving labels, at the specified command location.
pub fn semantic_error<T>(location: &ScriptLocation, msg: impl ToString) -> UResult<T> {
    Err(USimpleError::new(
        FATAL_EXIT_CODE,
        format!("{location}: error: {}", msg.to_string()),
    ))
}

/// Fail with msg as a processing error caused by the command at location.
pub fn runtime_error<T>(location: &ScriptLocation, msg: impl ToString) -> UResult<T> {
    Err(USimpleError::new(
        FATAL_EXIT_CODE,
        format!("{location}: {}", msg.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ScriptLocation {
        ScriptLocation {
            input_name: "script.stred".to_string(),
            line_number: 4,
            column_number: 7,
        }
    }

    #[test]
    fn test_compilation_error_format() {
        let lines = ScriptLineProvider::with_active_state("test.stred", 42);
        let mut line = ScriptCharProvider::new("whatever");
        for _ in 0..4 {
            line.advance();
        }

        let err = compilation_error::<()>(&lines, &line, "unexpected token").unwrap_err();
        assert_eq!(err.to_string(), "test.stred:42:5: error: unexpected token");
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_semantic_error_format() {
        let err = semantic_error::<()>(&location(), "undefined label `x'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "script.stred:4:7: error: undefined label `x'"
        );
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_runtime_error_format() {
        let err = runtime_error::<()>(&location(), "no previous regular expression").unwrap_err();
        assert_eq!(
            err.to_string(),
            "script.stred:4:7: no previous regular expression"
        );
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_location_at_position() {
        let lines = ScriptLineProvider::with_active_state("-e", 3);
        let mut line = ScriptCharProvider::new("1,3p");
        line.advance();
        line.advance();
        let location = ScriptLocation::at_position(&lines, &line);
        assert_eq!(location.to_string(), "-e:3:3");
    }
}
