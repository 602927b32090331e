//! Expansion syntax configuration and the recursive tokenizer.
//!
//! A [`Parser`] is a plain value: three ASCII delimiters and a flag.  Parsing
//! makes one left-to-right pass over the input, building a tree of [`Node`]s
//! that [`Template`] then renders.  Malformed or truncated expansions never
//! fail; they are kept as literal text.
//!
//! ## Recognised forms (default delimiters)
//!
//! | Input          | Node                                     |
//! |----------------|------------------------------------------|
//! | `$$`           | literal `$` (not in scoped-only mode)     |
//! | `$NAME`        | [`Node::Variable`] (not in scoped-only mode) |
//! | `${NAME}`      | [`Node::Variable`]                       |
//! | `${NAME:-alt}` | [`Node::Variable`] with a fallback       |
//! | `${NAME:+alt}` | [`Node::Defined`]                        |
//! | `${NAME:/alt}` | [`Node::Undefined`]                      |
//! | `\${`, `\\${`  | escapes, scoped-only mode only           |

use log::trace;

use crate::lookup::{FnLookup, Lookup, TryFnLookup};
use crate::node::{Node, Template};

/// Default lead character.
pub const DEFAULT_LEAD: u8 = b'$';
/// Default open character.
pub const DEFAULT_OPEN: u8 = b'{';
/// Default close character.
pub const DEFAULT_CLOSE: u8 = b'}';

// ── Configuration ─────────────────────────────────────────────────────────────

/// Expansion syntax settings.
///
/// `lead`, `open` and `close` are ASCII bytes.  A zero byte (or any byte
/// outside 7-bit ASCII) selects the corresponding default, so
/// `Parser::default()` behaves exactly like [`Parser::new`].
///
/// With `scoped_only` set, bare `$NAME` references are plain text and the
/// lead only starts an expansion when it is immediately followed by `open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Parser {
    pub scoped_only: bool,
    pub lead: u8,
    pub open: u8,
    pub close: u8,
}

/// Error returned by [`Parser::with_delimiters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterError {
    /// The delimiter is not a 7-bit ASCII character.
    NotAscii(char),
    /// NUL cannot be used as a delimiter.
    Nul,
    /// The same character was given for two delimiters.
    Duplicate(char),
}

impl std::fmt::Display for DelimiterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelimiterError::NotAscii(c) => write!(f, "delimiter {c:?} is not ASCII"),
            DelimiterError::Nul => write!(f, "delimiter cannot be NUL"),
            DelimiterError::Duplicate(c) => write!(f, "delimiter {c:?} is used more than once"),
        }
    }
}

impl std::error::Error for DelimiterError {}

impl Parser {
    /// The default `$`, `{`, `}` syntax with bare references enabled.
    pub const fn new() -> Self {
        Self {
            scoped_only: false,
            lead: DEFAULT_LEAD,
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
        }
    }

    /// Build a parser from three delimiter characters, rejecting anything
    /// that is not a distinct, non-NUL ASCII character.
    pub fn with_delimiters(lead: char, open: char, close: char) -> Result<Self, DelimiterError> {
        let mut bytes = [0u8; 3];
        for (slot, c) in bytes.iter_mut().zip([lead, open, close]) {
            if !c.is_ascii() {
                return Err(DelimiterError::NotAscii(c));
            }
            if c == '\0' {
                return Err(DelimiterError::Nul);
            }
            *slot = c as u8;
        }
        let [lead_b, open_b, close_b] = bytes;
        if lead_b == open_b || lead_b == close_b {
            return Err(DelimiterError::Duplicate(lead));
        }
        if open_b == close_b {
            return Err(DelimiterError::Duplicate(open));
        }
        Ok(Self {
            scoped_only: false,
            lead: lead_b,
            open: open_b,
            close: close_b,
        })
    }

    pub const fn with_lead(mut self, lead: u8) -> Self {
        self.lead = lead;
        self
    }

    pub const fn with_open(mut self, open: u8) -> Self {
        self.open = open;
        self
    }

    pub const fn with_close(mut self, close: u8) -> Self {
        self.close = close;
        self
    }

    /// Enable or disable scoped-only mode.
    pub const fn scoped(mut self, scoped_only: bool) -> Self {
        self.scoped_only = scoped_only;
        self
    }

    /// The effective lead character.
    pub const fn lead_char(&self) -> u8 {
        effective(self.lead, DEFAULT_LEAD)
    }

    /// The effective open character.
    pub const fn open_char(&self) -> u8 {
        effective(self.open, DEFAULT_OPEN)
    }

    /// The effective close character.
    pub const fn close_char(&self) -> u8 {
        effective(self.close, DEFAULT_CLOSE)
    }

    /// Expand `text`, resolving names with `lookup`.
    ///
    /// `lookup` returns `Some(value)` for a defined name and `None` otherwise.
    /// Undefined names and empty values both expand to nothing.
    ///
    /// Parsing and rendering recurse once per nested `:-`, `:+` or `:/`
    /// body, so nesting depth is limited by the thread's stack.  Thousands
    /// of unclosed levels can overflow a default-sized test thread.
    pub fn expand<F>(&self, text: &str, lookup: F) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        match self.expand_with(text, &mut FnLookup(lookup)) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    /// Like [`Parser::expand`], but with a fallible lookup.  The first lookup
    /// error aborts the expansion and is returned unchanged.
    pub fn try_expand<F, E>(&self, text: &str, lookup: F) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<Option<String>, E>,
    {
        self.expand_with(text, &mut TryFnLookup(lookup))
    }

    /// Expand `text` against any [`Lookup`] implementation.
    pub fn expand_with<L>(&self, text: &str, lookup: &mut L) -> Result<String, L::Error>
    where
        L: Lookup + ?Sized,
    {
        self.parse(text).render_with(lookup)
    }

    /// Parse `text` into a reusable [`Template`].
    pub fn parse(&self, text: &str) -> Template {
        let (_, nodes) = self.parse_until(text, None);
        Template::new(nodes, text.len())
    }

    /// Parse `text` until `stop` is seen outside any nested expansion.
    ///
    /// Returns the number of bytes consumed (the stop byte itself is not
    /// included) and the parsed nodes.
    pub(crate) fn parse_until(&self, text: &str, stop: Option<u8>) -> (usize, Vec<Node>) {
        Scanner::new(Syntax::of(self), text, stop).run()
    }
}

const fn effective(b: u8, default: u8) -> u8 {
    if b == 0 || !b.is_ascii() {
        default
    } else {
        b
    }
}

// ── Scanner ───────────────────────────────────────────────────────────────────

/// Resolved delimiters, fixed for the duration of one parse.
#[derive(Clone, Copy)]
struct Syntax {
    lead: u8,
    open: u8,
    close: u8,
    scoped_only: bool,
}

impl Syntax {
    fn of(p: &Parser) -> Self {
        Self {
            lead: p.lead_char(),
            open: p.open_char(),
            close: p.close_char(),
            scoped_only: p.scoped_only,
        }
    }

    fn is_ident(&self, c: u8) -> bool {
        !(c == b':' || c == self.close || c == self.lead || is_space(c))
    }
}

/// ASCII whitespace, including vertical tab.
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Branch selector following `:` inside braces.
#[derive(Clone, Copy, Debug)]
enum Selector {
    Fallback,
    Defined,
    Undefined,
}

impl Selector {
    fn from_byte(c: u8) -> Option<Self> {
        match c {
            b'-' => Some(Selector::Fallback),
            b'+' => Some(Selector::Defined),
            b'/' => Some(Selector::Undefined),
            _ => None,
        }
    }

    fn node(self, name: String, body: Vec<Node>) -> Node {
        match self {
            Selector::Fallback => Node::Variable { name, fallback: body },
            Selector::Defined => Node::Defined { name, body },
            Selector::Undefined => Node::Undefined { name, body },
        }
    }
}

/// Cursor over one input slice.
///
/// Every position where the scanner slices `text` sits next to an ASCII
/// byte, so slices always fall on UTF-8 boundaries.
struct Scanner<'a> {
    syn: Syntax,
    text: &'a str,
    stop: Option<u8>,
    /// Next byte to examine.
    pos: usize,
    /// Start of the literal span not yet flushed into `nodes`.
    start: usize,
    nodes: Vec<Node>,
}

impl<'a> Scanner<'a> {
    fn new(syn: Syntax, text: &'a str, stop: Option<u8>) -> Self {
        Self {
            syn,
            text,
            stop,
            pos: 0,
            start: 0,
            nodes: Vec::new(),
        }
    }

    fn byte(&self, i: usize) -> Option<u8> {
        self.text.as_bytes().get(i).copied()
    }

    fn run(mut self) -> (usize, Vec<Node>) {
        let end = loop {
            let i = self.pos;
            let Some(c) = self.byte(i) else {
                break self.text.len();
            };
            if self.stop == Some(c) {
                break i;
            }
            if c == b'\\' && self.is_escaped_open(i) {
                // Drop one backslash; what follows it is scanned normally,
                // starting one byte later.
                self.skip_byte(i);
                continue;
            }
            if c != self.syn.lead {
                self.pos += 1;
                continue;
            }
            match self.byte(i + 1) {
                None => self.pos += 1,
                Some(n) if !self.syn.scoped_only && n == self.syn.lead => self.skip_byte(i),
                Some(n) if n == self.syn.open => self.braced(i),
                Some(_) if self.syn.scoped_only => self.pos += 1,
                Some(_) => self.bare(i),
            }
        };
        self.flush(end);
        (end, self.nodes)
    }

    /// `\LEAD OPEN` or `\\LEAD OPEN` at `i`, honoured in scoped-only mode.
    fn is_escaped_open(&self, i: usize) -> bool {
        if !self.syn.scoped_only {
            return false;
        }
        let b = self.text.as_bytes();
        let (lead, open) = (self.syn.lead, self.syn.open);
        let double = i + 3 < b.len() && b[i + 1] == b'\\' && b[i + 2] == lead && b[i + 3] == open;
        let single = i + 2 < b.len() && b[i + 1] == lead && b[i + 2] == open;
        double || single
    }

    /// Remove the byte at `i` from the output and resume scanning at `i + 2`.
    fn skip_byte(&mut self, i: usize) {
        self.flush(i);
        self.start = i + 1;
        self.pos = i + 2;
    }

    /// Move `text[start..end]` into the node list.
    fn flush(&mut self, end: usize) {
        if self.start < end {
            push_literal(&mut self.nodes, &self.text[self.start..end]);
        }
        self.start = end;
    }

    /// Commit an expansion that began at `lead_at` and ended before `next`.
    fn commit(&mut self, lead_at: usize, node: Node, next: usize) {
        self.flush(lead_at);
        self.nodes.push(node);
        self.start = next;
        self.pos = next;
    }

    fn ident_end(&self, from: usize) -> usize {
        let b = self.text.as_bytes();
        let mut i = from;
        while i < b.len() && self.syn.is_ident(b[i]) {
            i += 1;
        }
        i
    }

    /// `LEAD NAME`.  An empty name leaves the lead as text.
    fn bare(&mut self, lead_at: usize) {
        let head = lead_at + 1;
        let tail = self.ident_end(head);
        if tail == head {
            self.pos = head;
            return;
        }
        let node = Node::Variable {
            name: self.text[head..tail].to_owned(),
            fallback: Vec::new(),
        };
        self.commit(lead_at, node, tail);
    }

    /// `LEAD OPEN ...`.
    fn braced(&mut self, lead_at: usize) {
        let head = lead_at + 2;
        let tail = self.ident_end(head);
        match self.byte(tail) {
            Some(c) if c == self.syn.close => {
                if tail == head {
                    self.pos = tail + 1;
                    return;
                }
                let node = Node::Variable {
                    name: self.text[head..tail].to_owned(),
                    fallback: Vec::new(),
                };
                self.commit(lead_at, node, tail + 1);
            }
            Some(b':') => self.selector(lead_at, head, tail),
            // Aborted or unterminated: keep the text, rescan from `tail`.
            _ => self.pos = tail,
        }
    }

    /// `LEAD OPEN NAME : SELECTOR BODY CLOSE`, with `colon` at the `:`.
    fn selector(&mut self, lead_at: usize, head: usize, colon: usize) {
        let after = colon + 1;
        let name = self.text[head..colon].trim();
        if name.is_empty() {
            self.pos = after;
            return;
        }
        let Some(selector) = self.byte(after).and_then(Selector::from_byte) else {
            self.pos = after;
            return;
        };

        let body_at = after + 1;
        let (used, body) =
            Scanner::new(self.syn, &self.text[body_at..], Some(self.syn.close)).run();
        let close_at = body_at + used;

        if self.byte(close_at) == Some(self.syn.close) {
            let node = selector.node(name.to_owned(), body);
            self.commit(lead_at, node, close_at + 1);
            return;
        }

        trace!(
            "unterminated {:?} expansion of {name:?} at byte {lead_at}; keeping it as text",
            selector
        );
        self.flush(body_at);
        for node in body {
            match node {
                Node::Literal(s) => push_literal(&mut self.nodes, &s),
                other => self.nodes.push(other),
            }
        }
        self.start = close_at;
        self.pos = close_at;
    }
}

/// Append literal text, merging with a preceding literal.
fn push_literal(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    match nodes.last_mut() {
        Some(Node::Literal(last)) => last.push_str(text),
        _ => nodes.push(Node::Literal(text.to_owned())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
