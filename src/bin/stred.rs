// Executable wrapper around the stred library
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::ffi::OsString;
use std::process;

fn main() {
    // Multicall mode must be known before uucore derives the utility name.
    let mut args: Vec<OsString> = std::env::args_os().collect();
    let multicall = args.len() > 1 && args[1] == "stred";
    if multicall {
        uucore::set_utility_is_second_arg();
    }

    uucore::panic::mute_sigpipe_panic();

    #[cfg(windows)]
    if let Some(binary_name) = args.get_mut(0) {
        let stripped = binary_name
            .to_string_lossy()
            .strip_suffix(".exe")
            .map(OsString::from);
        if let Some(stripped) = stripped {
            *binary_name = stripped;
        }
    }

    if multicall {
        args.remove(1);
    }

    process::exit(uu_stred::uumain(args.into_iter()));
}
