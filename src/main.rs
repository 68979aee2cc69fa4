//! A minimal demonstration binary: reads a single JSON file, compiles and
//! runs it through `ArkState`, and prints the host-projected result. The
//! real CLI driver, REPL, and surface-language front end are out of
//! scope — this exists only to exercise the crate end to end.

use std::{env, fs, process};

use ark::{host, ArkState};

fn main() {
    let mut args = env::args();
    let _program = args.next();
    let path = args.next().unwrap_or_else(|| {
        eprintln!("usage: ark <path-to-json-program>");
        process::exit(1);
    });

    let text = fs::read_to_string(&path).unwrap_or_else(|err| {
        eprintln!("cannot read {path}: {err}");
        process::exit(1);
    });

    let json: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|err| {
        eprintln!("{path}: invalid JSON: {err}");
        process::exit(1);
    });

    let state = ArkState::new();
    let value = state.eval(&json).unwrap_or_else(|err| {
        eprintln!("{path}: {err}");
        process::exit(1);
    });

    // A null top-level result is not printed, matching the convention that a
    // program run purely for its side effects (`print`, `fs.writeFile`, ...)
    // shouldn't also echo a value.
    let host_value = host::to_host(&value);
    if !host_value.is_null() {
        println!("{host_value}");
    }
}
