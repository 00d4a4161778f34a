//! Parse-check a single scope file.
//!
//! Exit status: 0 when the scope is valid, 1 when it is malformed, 2 on
//! usage or read errors.

use std::process::ExitCode;

use emat_scope::{Scope, ScopeError};

const USAGE: &str = "usage: emat_parse_scope <scope.yaml>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [path] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match Scope::from_yaml_file(path) {
        Ok(scope) => {
            println!(
                "ok(scope): name={} constants={} uncertainties={} levers={} measures={}",
                scope.name(),
                scope.constants().len(),
                scope.uncertainties().len(),
                scope.levers().len(),
                scope.measures().len()
            );
            ExitCode::SUCCESS
        }
        Err(err @ ScopeError::Read { .. }) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}
