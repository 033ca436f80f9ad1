// Integration tests
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::io::Write;
use tempfile::NamedTempFile;
use uutests::util::TestScenario;
use uutests::util_name;
use uutests::{at_and_ucmd, new_ucmd};

// Input files
const LINES1: &str = "input/lines1";
const LINES2: &str = "input/lines2";
const NO_NEW_LINE: &str = "input/no-new-line.txt";

// Return the lines named prefix_n for the specified range of n.
fn numbered_lines(prefix: &str, range: std::ops::RangeInclusive<usize>) -> String {
    range.map(|n| format!("{prefix}_{n}\n")).collect()
}

// Test application's invocation
#[test]
fn test_invalid_arg() {
    new_ucmd!().arg("--definitely-invalid").fails().code_is(1);
}

#[test]
fn test_missing_script_argument() {
    new_ucmd!()
        .fails()
        .code_is(1)
        .stderr_contains("missing script");
}

#[test]
fn test_empty_positional_script_ok() {
    new_ucmd!().arg("").succeeds().code_is(0);
}

#[test]
fn test_silent_alias() {
    new_ucmd!()
        .args(&["--silent", "2p"])
        .pipe_in("a\nb\nc\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_f_script_ok() {
    let mut temp = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp, "s/a/b/").expect("Failed to write to temp file");

    new_ucmd!()
        .arg("-f")
        .arg(temp.path())
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_script_pieces_in_argument_order() {
    let mut temp = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp, "s/b/c/").expect("Failed to write to temp file");

    new_ucmd!()
        .args(&["-e", "s/a/b/", "-f"])
        .arg(temp.path())
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("c\n");

    new_ucmd!()
        .arg("-f")
        .arg(temp.path())
        .args(&["-e", "s/a/b/"])
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_pieces_end_lines() {
    new_ucmd!()
        .args(&["-n", "-e", "2{", "-e", "p", "-e", "}"])
        .pipe_in("a\nb\nc\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_missing_script_file() {
    new_ucmd!()
        .args(&["-f", "no-such-script.stred"])
        .fails()
        .code_is(1);
}

// Input handling
#[test]
fn test_no_script_stdin() {
    new_ucmd!()
        .arg("")
        .pipe_in("one\ntwo\n")
        .succeeds()
        .stdout_is("one\ntwo\n");
}

#[test]
fn test_no_script_file() {
    new_ucmd!()
        .args(&["-e", "", LINES1])
        .succeeds()
        .stdout_is(numbered_lines("l1", 1..=14));
}

#[test]
fn test_delete_all() {
    new_ucmd!()
        .args(&["d", LINES1, LINES2])
        .succeeds()
        .no_stdout();
}

#[test]
fn test_missing_final_newline() {
    new_ucmd!()
        .args(&["", NO_NEW_LINE])
        .succeeds()
        .stdout_is("first line\nlast line");

    new_ucmd!()
        .args(&["$p", NO_NEW_LINE])
        .succeeds()
        .stdout_is("first line\nlast line\nlast line");

    new_ucmd!()
        .arg("s/x/y/")
        .pipe_in("no newline")
        .succeeds()
        .stdout_is("no newline");
}

#[test]
fn test_invalid_utf8_passes_through() {
    new_ucmd!()
        .arg("")
        .pipe_in(b"a\xffb\n".to_vec())
        .succeeds()
        .stdout_is_bytes(b"a\xffb\n");

    new_ucmd!()
        .arg("s/b/B/g")
        .pipe_in(b"ab\xfeb\n\xff".to_vec())
        .succeeds()
        .stdout_is_bytes(b"aB\xfeB\n\xff");
}

#[test]
fn test_unreadable_input_is_skipped() {
    new_ucmd!()
        .args(&["-n", "$p", "no-such-input.txt", LINES2])
        .succeeds()
        .stdout_is("l2_9\n")
        .stderr_contains("can't read");
}

#[test]
fn test_line_numbers_span_files() {
    new_ucmd!()
        .args(&["-n", "$=", LINES1, LINES2])
        .succeeds()
        .stdout_is("23\n");
}

// Addresses
#[test]
fn test_addr_one_line() {
    new_ucmd!()
        .args(&["-n", "4p", LINES1])
        .succeeds()
        .stdout_is("l1_4\n");
}

#[test]
fn test_addr_straddle() {
    new_ucmd!()
        .args(&["-n", "16p", LINES1, LINES2])
        .succeeds()
        .stdout_is("l2_2\n");
}

#[test]
fn test_addr_last_two_files() {
    new_ucmd!()
        .args(&["-n", "$p", LINES1, LINES2])
        .succeeds()
        .stdout_is("l2_9\n");
}

#[test]
fn test_addr_found() {
    new_ucmd!()
        .args(&["-n", "/l1_7/p", LINES1])
        .succeeds()
        .stdout_is("l1_7\n");
}

#[test]
fn test_addr_custom_delimiter() {
    new_ucmd!()
        .args(&["-n", r"\_l1\_7_p", LINES1])
        .succeeds()
        .stdout_is("l1_7\n");
}

#[test]
fn test_addr_letter_delimiter() {
    new_ucmd!()
        .args(&["-n", "zl1_7zp", LINES1])
        .succeeds()
        .stdout_is("l1_7\n");

    new_ucmd!()
        .args(&["-n", "3,Ql1_5Qp", LINES1])
        .succeeds()
        .stdout_is("l1_3\nl1_4\nl1_5\n");
}

#[test]
fn test_addr_range_numeric() {
    new_ucmd!()
        .args(&["-n", "1,4p", LINES1])
        .succeeds()
        .stdout_is(numbered_lines("l1", 1..=4));
}

#[test]
fn test_addr_range_to_pattern_across_files() {
    new_ucmd!()
        .args(&["-n", "13,/l2_2/p", LINES1, LINES2])
        .succeeds()
        .stdout_is("l1_13\nl1_14\nl2_1\nl2_2\n");
}

#[test]
fn test_addr_identical_ranges_independent() {
    new_ucmd!()
        .args(&["-n", "2,3p;2,3p"])
        .pipe_in("1\n2\n3\n4\n")
        .succeeds()
        .stdout_is("2\n2\n3\n3\n");

    new_ucmd!()
        .args(&["-n", "/2/,/3/p;/2/,/3/p"])
        .pipe_in("1\n2\n3\n4\n")
        .succeeds()
        .stdout_is("2\n2\n3\n3\n");
}

#[test]
fn test_addr_range_reverse() {
    new_ucmd!()
        .args(&["-n", "12,3p", LINES1])
        .succeeds()
        .stdout_is("l1_12\n");

    new_ucmd!()
        .args(&["-n", "2,1p"])
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("2\n");
}

#[test]
fn test_addr_range_closing_on_same_line() {
    new_ucmd!()
        .args(&["-n", "/l1_1/,/l1_1/p", LINES1])
        .succeeds()
        .stdout_is("l1_1\nl1_10\nl1_11\nl1_12\nl1_13\nl1_14\n");
}

#[test]
fn test_addr_negate() {
    new_ucmd!()
        .args(&["-n", "1,12!p", LINES1])
        .succeeds()
        .stdout_is("l1_13\nl1_14\n");
}

#[test]
fn test_addr_empty_re_reuse() {
    // The empty end RE matches the start line, closing each range at once.
    new_ucmd!()
        .args(&["-n", "/_2/,//p", LINES1])
        .succeeds()
        .stdout_is("l1_2\nl1_12\n");

    new_ucmd!()
        .args(&["-n", "/_2/,/_4/{//p}", LINES1])
        .succeeds()
        .stdout_is("l1_4\nl1_14\n");
}

// Substitution
#[test]
fn test_subst_first() {
    new_ucmd!()
        .arg("s/abc*/foo/")
        .pipe_in("###abccccc###\n")
        .succeeds()
        .stdout_is("###foo###\n");
}

#[test]
fn test_subst_numbered_occurrence() {
    new_ucmd!()
        .arg("s/abc*/foo/2")
        .pipe_in("###abccc###abccc###abccc###\n")
        .succeeds()
        .stdout_is("###abccc###foo###abccc###\n");
}

#[test]
fn test_subst_global() {
    new_ucmd!()
        .arg("s/abc*/foo/g")
        .pipe_in("###abccc###abccc###abccc###\n")
        .succeeds()
        .stdout_is("###foo###foo###foo###\n");
}

#[test]
fn test_subst_bre_groups() {
    new_ucmd!()
        .arg(r"s/\(abc*\)_\(def*\)/[\1]foo[\2]/")
        .pipe_in("###abccc_defff###\n")
        .succeeds()
        .stdout_is("###[abccc]foo[defff]###\n");
}

#[test]
fn test_subst_ere_groups() {
    new_ucmd!()
        .args(&["-E", r"s/(abc*)_(def*)/[\1]foo[\2]/"])
        .pipe_in("###abccc_defff###\n")
        .succeeds()
        .stdout_is("###[abccc]foo[defff]###\n");
}

#[test]
fn test_subst_whole_match() {
    new_ucmd!()
        .arg(r"s/[0-9][0-9]*/(&)/g")
        .pipe_in("a1b22c\n")
        .succeeds()
        .stdout_is("a(1)b(22)c\n");
}

#[test]
fn test_subst_empty_matches() {
    new_ucmd!()
        .arg("s/x*/-/g")
        .pipe_in("abc\n")
        .succeeds()
        .stdout_is("-a-b-c-\n");
}

#[test]
fn test_subst_print() {
    new_ucmd!()
        .args(&["-n", "s/1_1/S&/p", LINES1])
        .succeeds()
        .stdout_is("lS1_1\nlS1_10\nlS1_11\nlS1_12\nlS1_13\nlS1_14\n");
}

#[test]
fn test_subst_multiline_replacement() {
    new_ucmd!()
        .arg("s/_/\\\n/")
        .pipe_in("a_b\n")
        .succeeds()
        .stdout_is("a\nb\n");
}

#[test]
fn test_subst_write_file() {
    let (at, mut ucmd) = at_and_ucmd!();
    ucmd.args(&["-n", "s/_1$/S_1/w out.txt", LINES1])
        .succeeds()
        .no_stdout();
    assert_eq!(at.read("out.txt"), "l1S_1\n");
}

#[test]
fn test_subst_invalid_reference() {
    new_ucmd!()
        .arg(r"s/a/\1/")
        .pipe_in("a\n")
        .fails()
        .code_is(1)
        .stderr_contains("invalid reference \\1");
}

// Transliteration
#[test]
fn test_trans_simple() {
    new_ucmd!()
        .arg("y/0123456789/9876543210/")
        .pipe_in("l1_12\n")
        .succeeds()
        .stdout_is("l8_87\n");
}

#[test]
fn test_trans_newline() {
    new_ucmd!()
        .arg(r"N;y/\n/X/")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("aXb\n");
}

#[test]
fn test_trans_different_lengths() {
    new_ucmd!()
        .arg("y/abc/de/")
        .pipe_in("a\n")
        .fails()
        .code_is(1)
        .stderr_contains("different lengths");
}

// Pattern and hold space
#[test]
fn test_exchange_twice() {
    new_ucmd!()
        .arg("x;x")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("a\nb\n");
}

#[test]
fn test_hold_append_swap() {
    new_ucmd!()
        .args(&["-n", "2h;3H;4g;4p;5G;5p;6x;6p", LINES1])
        .succeeds()
        .stdout_is("l1_2\nl1_3\nl1_5\nl1_2\nl1_3\nl1_2\nl1_3\n");
}

#[test]
fn test_tac() {
    new_ucmd!()
        .args(&["-n", "1!G;h;$p"])
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("3\n2\n1\n");
}

#[test]
fn test_delete_to_newline() {
    new_ucmd!()
        .arg("N;N;D")
        .pipe_in("foo\nbar\nbaz\n")
        .succeeds()
        .stdout_is("bar\nbaz\n");
}

#[test]
fn test_delete_to_newline_without_newline() {
    new_ucmd!()
        .args(&["2D", LINES1])
        .succeeds()
        .stdout_is(format!("l1_1\n{}", numbered_lines("l1", 3..=14)));
}

#[test]
fn test_next() {
    new_ucmd!()
        .args(&["-n", "4n;p", LINES1])
        .succeeds()
        .stdout_is(format!(
            "{}{}",
            numbered_lines("l1", 1..=3),
            numbered_lines("l1", 5..=14)
        ));
}

#[test]
fn test_append_next_at_end_prints() {
    new_ucmd!()
        .arg("N;s/\\n/-/")
        .pipe_in("1\n2\n3\n")
        .succeeds()
        .stdout_is("1-2\n3\n");
}

#[test]
fn test_print_to_newline() {
    new_ucmd!()
        .args(&["-n", "1{N;P;P;p}", LINES1])
        .succeeds()
        .stdout_is("l1_1\nl1_1\nl1_1\nl1_2\n");
}

#[test]
fn test_quit() {
    new_ucmd!()
        .args(&["5q", LINES1, LINES2])
        .succeeds()
        .stdout_is(numbered_lines("l1", 1..=5));
}

#[test]
fn test_quit_quiet() {
    new_ucmd!()
        .args(&["-n", "2q", LINES1])
        .succeeds()
        .no_stdout();
}

// Text commands
#[test]
fn test_append_after_autoprint() {
    new_ucmd!()
        .arg("1a\\\nhello")
        .pipe_in("x\ny\n")
        .succeeds()
        .stdout_is("x\nhello\ny\n");
}

#[test]
fn test_append_multiline_text() {
    new_ucmd!()
        .arg("$a\\\nfoo\\\nbar")
        .pipe_in("x\n")
        .succeeds()
        .stdout_is("x\nfoo\nbar\n");
}

#[test]
fn test_insert() {
    new_ucmd!()
        .arg("2i\\\nnew")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("a\nnew\nb\n");
}

#[test]
fn test_text_requires_backslash() {
    new_ucmd!()
        .arg("1a hello")
        .pipe_in("x\n")
        .fails()
        .code_is(1)
        .stderr_contains("expected \\ after");
}

#[test]
fn test_change_range_once() {
    new_ucmd!()
        .arg("2,3c\\\nnew")
        .pipe_in("1\n2\n3\n4\n")
        .succeeds()
        .stdout_is("1\nnew\n4\n");
}

#[test]
fn test_line_number() {
    new_ucmd!()
        .arg("=")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("1\na\n2\nb\n");
}

#[test]
fn test_list_wrap() {
    let line = "0123456789".repeat(6) + "foo";
    new_ucmd!()
        .args(&["-n", "l"])
        .pipe_in(format!("{line}\n"))
        .succeeds()
        .stdout_is(format!("{}\\\n{}$\n", &line[..60], &line[60..]));
}

#[test]
fn test_list_escapes() {
    new_ucmd!()
        .args(&["-n", "l"])
        .pipe_in("a\tb\\c\x01\n")
        .succeeds()
        .stdout_is("a\\tb\\\\c\\001$\n");
}

#[test]
fn test_list_line_length() {
    new_ucmd!()
        .args(&["-n", "-l", "5", "l"])
        .pipe_in("abcdefgh\n")
        .succeeds()
        .stdout_is("abcde\\\nfgh$\n");
}

#[test]
fn test_list_invalid_utf8() {
    new_ucmd!()
        .args(&["-n", "l"])
        .pipe_in(b"a\xffb\n".to_vec())
        .succeeds()
        .stdout_is("a\\377b$\n");
}

// Files
#[test]
fn test_read_file() {
    new_ucmd!()
        .args(&["$r input/lines2"])
        .pipe_in("x\n")
        .succeeds()
        .stdout_is(format!("x\n{}", numbered_lines("l2", 1..=9)));
}

#[test]
fn test_read_missing_file() {
    new_ucmd!()
        .arg("r no-such-file.txt")
        .pipe_in("x\n")
        .succeeds()
        .stdout_is("x\n");
}

#[test]
fn test_write_appends() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("out.txt", "old\n");
    ucmd.args(&["-n", "/a/w out.txt"])
        .pipe_in("a\nb\na\n")
        .succeeds()
        .no_stdout();
    assert_eq!(at.read("out.txt"), "old\na\na\n");
}

#[test]
fn test_write_open_failure() {
    new_ucmd!()
        .arg("w no-such-dir/out.txt")
        .pipe_in("a\n")
        .fails()
        .code_is(1)
        .stderr_contains("couldn't open file");
}

// Control flow
#[test]
fn test_branch_loop() {
    new_ucmd!()
        .args(&["-e", ":a", "-e", "s/^x//", "-e", "/^x/ba"])
        .pipe_in("xxxy\n")
        .succeeds()
        .stdout_is("y\n");
}

#[test]
fn test_branch_to_end() {
    new_ucmd!()
        .args(&["-e", "b", "-e", "d"])
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("a\n");
}

#[test]
fn test_test_commify() {
    new_ucmd!()
        .args(&[
            "-e",
            ":a",
            "-e",
            r"s/\([0-9]\)\([0-9]\{3\}\)\($\|,\)/\1,\2\3/",
            "-e",
            "ta",
        ])
        .pipe_in("1234567\n")
        .succeeds()
        .stdout_is("1,234,567\n");
}

#[test]
fn test_undefined_label() {
    new_ucmd!()
        .arg("b nowhere")
        .fails()
        .code_is(1)
        .stderr_contains("undefined label `nowhere'");
}

// Comments
#[test]
fn test_hash_n_first_line() {
    new_ucmd!()
        .arg("#n\n2p")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("b\n");
}

#[test]
fn test_hash_n_needs_whole_line() {
    new_ucmd!()
        .arg("#no\n2p")
        .pipe_in("a\nb\n")
        .succeeds()
        .stdout_is("a\nb\nb\n");
}

// Compilation errors
#[test]
fn test_invalid_command() {
    new_ucmd!()
        .arg("1,3k")
        .fails()
        .code_is(1)
        .no_stdout()
        .stderr_contains("1,3k:1:4: error: invalid command code `k'");
}

#[test]
fn test_unmatched_brace() {
    new_ucmd!()
        .arg("1{p")
        .fails()
        .code_is(1)
        .stderr_contains("unmatched `{'");
}

#[test]
fn test_unterminated_substitute() {
    new_ucmd!()
        .arg("s/a/b")
        .fails()
        .code_is(1)
        .stderr_contains("unterminated `s' command");
}

#[test]
fn test_unknown_subst_option() {
    new_ucmd!()
        .arg("s/a/b/z")
        .fails()
        .code_is(1)
        .stderr_contains("unknown option to `s'");
}

#[test]
fn test_too_many_addresses() {
    new_ucmd!().arg("1,2q").fails().code_is(1);
}

#[test]
fn test_unbuffered() {
    new_ucmd!()
        .args(&["-u", "p"])
        .pipe_in("a\n")
        .succeeds()
        .stdout_is("a\na\n");
}
