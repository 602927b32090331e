//! Expand a template against the process environment.
//!
//! Usage:
//!   cargo run --example env_expand -- '<template>' [<vars-file>]
//!
//! When a variable file is given, its definitions take precedence over the
//! environment, and its own values may refer to environment variables.

use std::path::Path;

use expand::{Config, Env, Lookup, Parser};

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(template) = args.next() else {
        eprintln!("Usage: env_expand '<template>' [<vars-file>]");
        std::process::exit(1);
    };

    let parser = Parser::new();
    let mut vars = match args.next() {
        Some(path) => match Config::load_file(Path::new(&path), &parser) {
            Ok((config, errors)) => {
                for e in &errors {
                    eprintln!("env_expand: {path}: {e}");
                }
                config.vars
            }
            Err(e) => {
                eprintln!("env_expand: cannot read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Default::default(),
    };

    let mut lookup = (&mut vars).or(Env);
    match parser.expand_with(&template, &mut lookup) {
        Ok(out) => println!("{out}"),
        Err(never) => match never {},
    }
}
