//! Expansion tree and renderer.

use crate::lookup::{FnLookup, Lookup, TryFnLookup};

/// One parsed element of an input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text copied to the output as-is.
    Literal(String),
    /// `$NAME`, `${NAME}` or `${NAME:-fallback}`.
    ///
    /// The value is emitted when `name` is defined; otherwise `fallback`
    /// (empty for the plain forms) is rendered instead.
    Variable { name: String, fallback: Vec<Node> },
    /// `${NAME:+body}`: `body` is rendered only when `name` is defined.
    Defined { name: String, body: Vec<Node> },
    /// `${NAME:/body}`: `body` is rendered only when `name` is undefined.
    Undefined { name: String, body: Vec<Node> },
}

impl Node {
    /// The variable this node refers to, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Literal(_) => None,
            Node::Variable { name, .. } | Node::Defined { name, .. } | Node::Undefined { name, .. } => {
                Some(name.as_str())
            }
        }
    }

    /// Nodes rendered conditionally on this node's lookup.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Literal(_) => &[],
            Node::Variable { fallback, .. } => fallback.as_slice(),
            Node::Defined { body, .. } | Node::Undefined { body, .. } => body.as_slice(),
        }
    }

    fn render_into<L>(&self, lookup: &mut L, out: &mut String) -> Result<(), L::Error>
    where
        L: Lookup + ?Sized,
    {
        match self {
            Node::Literal(text) => out.push_str(text),
            Node::Variable { name, fallback } => {
                if let Some(value) = lookup.get(name)? {
                    out.push_str(&value);
                    return Ok(());
                }
                render_all(fallback, lookup, out)?;
            }
            Node::Defined { name, body } => {
                if lookup.is_defined(name)? {
                    render_all(body, lookup, out)?;
                }
            }
            Node::Undefined { name, body } => {
                if !lookup.is_defined(name)? {
                    render_all(body, lookup, out)?;
                }
            }
        }
        Ok(())
    }
}

fn render_all<L>(nodes: &[Node], lookup: &mut L, out: &mut String) -> Result<(), L::Error>
where
    L: Lookup + ?Sized,
{
    for node in nodes {
        node.render_into(lookup, out)?;
    }
    Ok(())
}

// ── Template ──────────────────────────────────────────────────────────────────

/// A parsed input string, ready to render.
///
/// Rendering never caches lookups: each call walks the tree again and asks
/// the lookup afresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
    source_len: usize,
}

impl Template {
    pub(crate) fn new(nodes: Vec<Node>, source_len: usize) -> Self {
        Self { nodes, source_len }
    }

    /// Top-level nodes in input order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Names referenced anywhere in the tree, in first-occurrence order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_names(&self.nodes, &mut names);
        names
    }

    pub fn render<F>(&self, lookup: F) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        match self.render_with(&mut FnLookup(lookup)) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    pub fn try_render<F, E>(&self, lookup: F) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<Option<String>, E>,
    {
        self.render_with(&mut TryFnLookup(lookup))
    }

    /// Render against any [`Lookup`].  A lookup error aborts rendering and
    /// no partial output is returned.
    pub fn render_with<L>(&self, lookup: &mut L) -> Result<String, L::Error>
    where
        L: Lookup + ?Sized,
    {
        let mut out = String::with_capacity(self.source_len * 2);
        render_all(&self.nodes, lookup, &mut out)?;
        Ok(out)
    }
}

fn collect_names<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        if let Some(name) = node.name() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        collect_names(node.children(), names);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn lookup(key: &str) -> Option<String> {
        (key != "none").then(|| "text".to_string())
    }

    #[test]
    fn literal_only() {
        let t = Parser::new().parse("plain");
        assert_eq!(t.nodes(), &[Node::Literal("plain".into())]);
        assert_eq!(t.render(lookup), "plain");
    }

    #[test]
    fn fallback_only_when_undefined() {
        let t = Parser::new().parse("${key:-a}|${none:-b}");
        assert_eq!(t.render(lookup), "text|b");
    }

    #[test]
    fn defined_and_undefined_branches() {
        let t = Parser::new().parse("${key:+A}${key:/B}|${none:+A}${none:/B}");
        assert_eq!(t.render(lookup), "A|B");
    }

    #[test]
    fn empty_value_is_still_defined() {
        let t = Parser::new().parse("[${e}][${e:-fb}][${e:+set}][${e:/unset}]");
        assert_eq!(t.render(|_| Some(String::new())), "[][][set][]");
        assert_eq!(t.render(|_| None), "[][fb][][unset]");
    }

    #[test]
    fn variables_in_first_occurrence_order() {
        let t = Parser::new().parse("$b ${a:-${c}} ${b:+$d}");
        assert_eq!(t.variables(), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn template_renders_repeatedly_without_caching() {
        let t = Parser::new().parse("$n");
        let mut calls = 0;
        let mut count = |_: &str| {
            calls += 1;
            Some(calls.to_string())
        };
        assert_eq!(t.render(&mut count), "1");
        assert_eq!(t.render(&mut count), "2");
    }

    #[test]
    fn lookup_error_aborts_render() {
        let t = Parser::new().parse("ok ${bad} never");
        let got: Result<String, String> =
            t.try_render(|k| if k == "bad" { Err(format!("lookup of {k} failed")) } else { Ok(None) });
        assert_eq!(got, Err("lookup of bad failed".to_string()));
    }
}
