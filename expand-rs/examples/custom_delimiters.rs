//! The same greeting rendered with the default `${…}` syntax and with a
//! scoped-only `%(…)` parser.

use std::collections::HashMap;

use expand::Parser;

fn main() {
    let env: HashMap<&str, &str> = [("NAME", "Example")].into();
    let getenv = |name: &str| env.get(name).map(|v| v.to_string());

    println!(
        "{}",
        expand::expand(
            "Hello, ${NAME:-World}. ${NAME:+I was given your name.}${NAME:/I was not given your name.}",
            getenv,
        )
    );
    println!(
        "{}",
        expand::expand(
            "This is in ${ENVIRON:-testing}. ${ENVIRON:+This environment was given.}${ENVIRON:/This is the default environment.}",
            getenv,
        )
    );

    let parser = Parser::new().with_lead(b'%').with_open(b'(').with_close(b')').scoped(true);
    println!(
        "{}",
        parser.expand(
            "Hello, %(NAME:-World). %(NAME:+I was given your name.)%(NAME:/I was not given your name.)",
            getenv,
        )
    );
    println!("{}", parser.expand("Bare %NAME is left alone.", getenv));
}
