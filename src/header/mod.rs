//! `syscfg.h` generation.
//!
//! The header is assembled completely in memory, then handed to the writer
//! which only touches disk when the bytes differ from the existing file.

mod writer;

pub use writer::{header_path, write_if_changed, WriteOutcome, HEADER_FILENAME, INCLUDE_SUBDIR};

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use crate::error::SyscfgError;
use crate::resolve::{Resolution, Setting};
use crate::symbol::setting_symbol;

/// Include guard of the generated header.
pub const INCLUDE_GUARD: &str = "H_MYNEWT_SYSCFG_";

const CHECK_MACROS: &str = "/**
 * These macros exists to ensure code includes this header when needed.  If
 * code checks the existence of a setting directly via ifdef without including
 * this header, the setting macro will silently evaluate to 0.  In contrast, an
 * attempt to use these macros without including this header will result in a
 * compiler error.
 */
#define MYNEWT_VAL(x)                           MYNEWT_VAL_ ## x
#define MYNEWT_PKG(x)                           MYNEWT_PKG_ ## x
#define MYNEWT_API(x)                           MYNEWT_API_ ## x
";

fn write_preamble(out: &mut String) {
    let _ = write!(
        out,
        "/**\n * This file was generated by syscfg {}\n */\n\n",
        env!("CARGO_PKG_VERSION")
    );
}

fn write_define(out: &mut String, symbol: &str, value: &str) {
    let _ = writeln!(out, "#ifndef {}", symbol);
    let _ = writeln!(out, "#define {} ({})", symbol, value);
    out.push_str("#endif\n");
}

fn write_comment(out: &mut String, setting: &Setting) {
    if setting.is_overridden() {
        let _ = writeln!(
            out,
            "/* Overridden by {} (defined by {}) */",
            setting.most_recent().source.label(),
            setting.definer().source.label()
        );
    }
}

fn write_settings(out: &mut String, res: &Resolution) {
    out.push_str("/***** Settings */\n");

    for (package, entries) in res.entries_by_package() {
        let _ = write!(out, "\n/*** {} */\n", package);

        let mut first = true;
        for setting in entries.iter().filter(|s| !s.value.is_empty()) {
            if !first {
                out.push('\n');
            }
            first = false;

            write_comment(out, setting);
            write_define(out, &setting_symbol(&setting.name), &setting.value);
        }
    }
}

fn write_presence(out: &mut String, title: &str, table: &BTreeMap<String, bool>) {
    let (present, absent): (Vec<&String>, Vec<&String>) =
        table.keys().partition(|symbol| table[symbol.as_str()]);

    let _ = writeln!(out, "/*** {} (present) */", title);
    for symbol in present {
        out.push('\n');
        write_define(out, symbol, "1");
    }

    let _ = write!(out, "\n/*** {} (not present) */\n", title);
    for symbol in absent {
        out.push('\n');
        write_define(out, symbol, "0");
    }
}

/// Render the header for an already finalized resolution.
pub fn render_header(res: &Resolution) -> String {
    let mut out = String::new();

    write_preamble(&mut out);
    let _ = write!(out, "#ifndef {0}\n#define {0}\n\n", INCLUDE_GUARD);

    out.push_str(CHECK_MACROS);
    out.push('\n');

    write_settings(&mut out, res);
    out.push('\n');

    write_presence(&mut out, "Packages", res.roster.packages());
    out.push('\n');

    write_presence(&mut out, "APIs", res.roster.apis());
    out.push('\n');

    out.push_str("#endif\n");
    out
}

/// Allocate priorities, run the second resolver pass, render, and write
/// `<target_root>/include/syscfg/syscfg.h` if its contents changed.
///
/// Any failure before the write leaves an existing header untouched.
pub fn ensure_written(res: &mut Resolution, target_root: &Path) -> Result<WriteOutcome, SyscfgError> {
    res.finalize()?;

    let contents = render_header(res);
    let path = header_path(target_root);
    let outcome = write_if_changed(&path, contents.as_bytes())?;

    if outcome.written {
        debug!("syscfg changed; writing header file ({}).", path.display());
    } else {
        debug!("syscfg unchanged; not writing header file ({}).", path.display());
    }

    Ok(outcome)
}
