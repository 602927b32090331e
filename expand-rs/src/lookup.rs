//! Variable lookup sources.
//!
//! The renderer only talks to a [`Lookup`].  Closures, maps, the process
//! environment and [`VarStore`](crate::VarStore) all implement it, and
//! [`Lookup::or`] layers two sources so the first one that defines a name wins.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::hash::BuildHasher;

use log::debug;

/// A source of variable values.
///
/// `get` returns `Ok(None)` for an undefined name.  A defined name may have
/// an empty value; that is still "defined" for `:+`, `:/` and `:-`.
pub trait Lookup {
    /// Error raised by the source.  It aborts the expansion in progress.
    type Error;

    /// Fetch the value of `name`.
    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Self::Error>;

    /// Whether `name` is defined.  Used by `:+` and `:/`, which never need
    /// the value itself.
    fn is_defined(&mut self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.get(name)?.is_some())
    }

    /// Consult `self` first, then `other`.
    fn or<O>(self, other: O) -> Layered<Self, O>
    where
        Self: Sized,
        O: Lookup<Error = Self::Error>,
    {
        Layered(self, other)
    }
}

impl<L: Lookup + ?Sized> Lookup for &mut L {
    type Error = L::Error;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Self::Error> {
        (**self).get(name)
    }

    fn is_defined(&mut self, name: &str) -> Result<bool, Self::Error> {
        (**self).is_defined(name)
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Adapts `FnMut(&str) -> Option<String>` into an infallible [`Lookup`].
pub struct FnLookup<F>(pub F);

impl<F> Lookup for FnLookup<F>
where
    F: FnMut(&str) -> Option<String>,
{
    type Error = Infallible;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Infallible> {
        Ok((self.0)(name).map(Cow::Owned))
    }
}

/// Adapts `FnMut(&str) -> Result<Option<String>, E>` into a fallible [`Lookup`].
pub struct TryFnLookup<F>(pub F);

impl<F, E> Lookup for TryFnLookup<F>
where
    F: FnMut(&str) -> Result<Option<String>, E>,
{
    type Error = E;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, E> {
        Ok((self.0)(name)?.map(Cow::Owned))
    }
}

/// Wrap a function that only returns a value, treating `""` as undefined.
///
/// ```
/// let lookup = expand::from_simple_lookup(|k| if k == "USER" { "ada".into() } else { String::new() });
/// assert_eq!(expand::expand("${USER:+hi }${USER}${HOST:-?}", lookup), "hi ada?");
/// ```
pub fn from_simple_lookup<F>(mut f: F) -> impl FnMut(&str) -> Option<String>
where
    F: FnMut(&str) -> String,
{
    move |name: &str| {
        let value = f(name);
        (!value.is_empty()).then_some(value)
    }
}

// ── Maps ──────────────────────────────────────────────────────────────────────

impl<S: BuildHasher> Lookup for HashMap<String, String, S> {
    type Error = Infallible;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Infallible> {
        Ok(HashMap::get(self, name).map(|v| Cow::Borrowed(v.as_str())))
    }

    fn is_defined(&mut self, name: &str) -> Result<bool, Infallible> {
        Ok(self.contains_key(name))
    }
}

impl Lookup for BTreeMap<String, String> {
    type Error = Infallible;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Infallible> {
        Ok(BTreeMap::get(self, name).map(|v| Cow::Borrowed(v.as_str())))
    }

    fn is_defined(&mut self, name: &str) -> Result<bool, Infallible> {
        Ok(self.contains_key(name))
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

/// The process environment.
///
/// Names that the platform cannot represent (empty, or containing `=` or
/// NUL) and values that are not valid Unicode are reported as undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Env;

impl Lookup for Env {
    type Error = Infallible;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Infallible> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return Ok(None);
        }
        match std::env::var(name) {
            Ok(v) => Ok(Some(Cow::Owned(v))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                debug!("environment variable {name:?} is not valid Unicode; treating as unset");
                Ok(None)
            }
        }
    }
}

// ── Layering ──────────────────────────────────────────────────────────────────

/// Two lookups consulted in order; see [`Lookup::or`].
#[derive(Debug, Clone, Default)]
pub struct Layered<A, B>(pub A, pub B);

impl<A, B> Lookup for Layered<A, B>
where
    A: Lookup,
    B: Lookup<Error = A::Error>,
{
    type Error = A::Error;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Self::Error> {
        if let Some(v) = self.0.get(name)? {
            return Ok(Some(v));
        }
        self.1.get(name)
    }

    fn is_defined(&mut self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.0.is_defined(name)? || self.1.is_defined(name)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
