//! Variable file loader.
//!
//! A variable file is a list of assignments, one per line:
//!
//! | Line | Action |
//! |------|--------|
//! | `NAME=value` | set `NAME`, expanding `${…}` in `value` first |
//! | `export NAME=value` | same; the `export` keyword is ignored |
//! | `NAME="value"` | quotes are stripped, the value is still expanded |
//! | `NAME='value'` | quotes are stripped, the value is stored verbatim |
//! | Lines starting with `#` or `;` | comment, ignored |
//!
//! Values are expanded against the variables defined on earlier lines, then
//! against an optional base lookup such as [`Env`](crate::Env), so
//! `LOGDIR=${HOME}/log` works as expected.

use std::convert::Infallible;
use std::path::Path;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::lookup::{Layered, Lookup};
use crate::parser::Parser;
use crate::var::VarStore;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a variable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Variables loaded from a variable file.
#[derive(Debug, Default)]
pub struct Config {
    pub vars: VarStore,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a variable file, expanding values with `parser`.
    ///
    /// Malformed lines are skipped and reported; everything else is loaded.
    pub fn load_str(s: &str, parser: &Parser) -> (Self, Vec<ConfigError>) {
        Self::load_str_with(s, parser, &mut VarStore::new())
    }

    /// Like [`Config::load_str`], falling back to `base` for names the file
    /// has not (yet) defined.  `base` is only read, never written.
    pub fn load_str_with<B>(s: &str, parser: &Parser, base: &mut B) -> (Self, Vec<ConfigError>)
    where
        B: Lookup<Error = Infallible> + ?Sized,
    {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            match parse_line(line) {
                Ok((name, Value::Verbatim(v))) => config.vars.set(name, v),
                Ok((name, Value::Expand(v))) => {
                    let mut scope = Layered(&mut config.vars, &mut *base);
                    let value = match parser.expand_with(v, &mut scope) {
                        Ok(value) => value,
                        Err(never) => match never {},
                    };
                    config.vars.set(name, value);
                }
                Err(message) => {
                    warn!("skipping variable file line {lineno}: {message}");
                    errors.push(ConfigError { line: lineno, message });
                }
            }
        }

        (config, errors)
    }

    /// Read and parse a variable file from disk.
    pub fn load_file(path: &Path, parser: &Parser) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s, parser))
    }
}

// ── Line parsing ──────────────────────────────────────────────────────────────

enum Value<'a> {
    Verbatim(&'a str),
    Expand(&'a str),
}

fn assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=(.*)$")
            .expect("assignment pattern is valid")
    })
}

fn parse_line(line: &str) -> Result<(&str, Value<'_>), String> {
    let Some(caps) = assignment().captures(line) else {
        return Err(match line.split_once('=') {
            Some((name, _)) => format!("invalid variable name {:?}", name.trim()),
            None => format!("expected NAME=value, got {line:?}"),
        });
    };
    let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
        return Err(format!("expected NAME=value, got {line:?}"));
    };
    Ok((name.as_str(), unquote(value.as_str().trim())?))
}

fn unquote(v: &str) -> Result<Value<'_>, String> {
    for (quote, verbatim) in [('\'', true), ('"', false)] {
        let Some(rest) = v.strip_prefix(quote) else { continue };
        let Some(inner) = rest.strip_suffix(quote) else {
            return Err(format!("unterminated {quote} quote"));
        };
        return Ok(if verbatim { Value::Verbatim(inner) } else { Value::Expand(inner) });
    }
    Ok(Value::Expand(v))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(s: &str) -> (Config, Vec<ConfigError>) {
        Config::load_str(s, &Parser::new())
    }

    #[test]
    fn simple_assignments() {
        let (cfg, errs) = load("a=1\nb = two words \n");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("a"), Some("1"));
        assert_eq!(cfg.vars.get("b"), Some("two words"));
    }

    #[test]
    fn export_prefix_ignored() {
        let (cfg, errs) = load("export PATH_EXTRA=/opt/bin");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("PATH_EXTRA"), Some("/opt/bin"));
    }

    #[test]
    fn values_expand_earlier_definitions() {
        let (cfg, errs) = load("ROOT=/srv\nLOG=${ROOT}/log\nLEVEL=${DEBUG:+debug}${DEBUG:/info}");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("LOG"), Some("/srv/log"));
        assert_eq!(cfg.vars.get("LEVEL"), Some("info"));
    }

    #[test]
    fn later_lines_overwrite() {
        let (cfg, _) = load("x=1\nx=$x$x");
        assert_eq!(cfg.vars.get("x"), Some("11"));
    }

    #[test]
    fn quoting() {
        let (cfg, errs) = load("a=v\nsq='${a} stays'\ndq=\"${a} expands \"\nempty=\"\"");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("sq"), Some("${a} stays"));
        assert_eq!(cfg.vars.get("dq"), Some("v expands "));
        assert_eq!(cfg.vars.get("empty"), Some(""));
        assert!(cfg.vars.contains("empty"));
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let (cfg, errs) = load("# comment\n; also a comment\n\n  \nreal=yes");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("real"), Some("yes"));
        assert_eq!(cfg.vars.len(), 1);
    }

    #[test]
    fn bad_lines_reported_with_line_numbers() {
        let (cfg, errs) = load("ok=1\nno equals here\n1bad=x\nq='open\nok2=2");
        assert_eq!(cfg.vars.get("ok"), Some("1"));
        assert_eq!(cfg.vars.get("ok2"), Some("2"));
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(errs[1].message, "invalid variable name \"1bad\"");
        assert_eq!(errs[2].to_string(), "line 4: unterminated ' quote");
    }

    #[test]
    fn base_lookup_is_fallback() {
        let mut base: VarStore = [("HOME", "/home/ada"), ("SHADOW", "base")].into_iter().collect();
        let (cfg, errs) = Config::load_str_with(
            "SHADOW=file\nA=${HOME}/x\nB=${SHADOW}",
            &Parser::new(),
            &mut base,
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("A"), Some("/home/ada/x"));
        assert_eq!(cfg.vars.get("B"), Some("file"));
        assert!(!cfg.vars.contains("HOME"));
    }

    #[test]
    fn custom_syntax_for_values() {
        let p = Parser::with_delimiters('%', '(', ')').unwrap().scoped(true);
        let (cfg, errs) = Config::load_str("a=1\nb=%(a)-$a", &p);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("b"), Some("1-$a"));
    }

    #[test]
    fn load_file_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "GREETING=hello").unwrap();
        writeln!(f, "MSG=${{GREETING}}, world").unwrap();
        let (cfg, errs) = Config::load_file(f.path(), &Parser::new()).unwrap();
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("MSG"), Some("hello, world"));
    }

    #[test]
    fn load_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_file(&dir.path().join("absent.env"), &Parser::new()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
