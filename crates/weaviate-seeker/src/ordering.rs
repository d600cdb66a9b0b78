//! Sort directives.
//!
//! Provides [`Dir`] for sort direction, [`OrderBy`] for one rendered sort
//! spec and [`SortSpec`], the ordered accumulator that is lowered to the
//! wire grammar only when a query is compiled.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SeekerError};
use crate::meta::META_ATTRIBUTES;
use crate::value::quote;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Returns `true` if this is descending order.
    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Returns the wire name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl FromStr for Dir {
    type Err = SeekerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Dir::Asc),
            "desc" => Ok(Dir::Desc),
            other => Err(SeekerError::SortingOption(other.to_string())),
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single sort spec: backend path and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Backend path, after meta-attribute renaming.
    pub path: String,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderBy {
    /// Validates `attribute` and builds a spec for it.
    ///
    /// `id` becomes `_id`, and meta-attributes become `_` plus their backend
    /// name. Anything that does not look like an identifier is a
    /// [`SeekerError::TypeMismatch`].
    pub fn new(attribute: &str, dir: Dir) -> Result<Self> {
        if !IDENTIFIER.is_match(attribute) {
            return Err(SeekerError::type_mismatch(format!(
                "invalid sorting attribute '{attribute}'"
            )));
        }
        let path = if attribute == "id" {
            "_id".to_string()
        } else {
            META_ATTRIBUTES
                .filter_path(attribute)
                .unwrap_or_else(|| attribute.to_string())
        };
        Ok(OrderBy { path, dir })
    }

    /// Creates a new ascending spec.
    pub fn asc(attribute: &str) -> Result<Self> {
        OrderBy::new(attribute, Dir::Asc)
    }

    /// Creates a new descending spec.
    pub fn desc(attribute: &str) -> Result<Self> {
        OrderBy::new(attribute, Dir::Desc)
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ path: [{}], order: {} }}", quote(&self.path), self.dir)
    }
}

/// Ordered accumulation of sort specs across `order` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    orderings: Vec<OrderBy>,
}

impl SortSpec {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        SortSpec::default()
    }

    /// Builds the specs for one `order` call without storing them.
    ///
    /// Bare attributes come first (ascending), then the labeled pairs, each
    /// in the order given.
    pub fn prepare(attributes: &[&str], directed: &[(&str, &str)]) -> Result<Vec<OrderBy>> {
        if attributes.is_empty() && directed.is_empty() {
            return Err(SeekerError::ArgumentShape(
                "expected at least one argument".to_string(),
            ));
        }
        let bare = attributes.iter().map(|attribute| OrderBy::asc(attribute));
        let labeled = directed
            .iter()
            .map(|(attribute, dir)| OrderBy::new(attribute, dir.parse()?));
        bare.chain(labeled).collect()
    }

    /// Appends specs after those already accumulated.
    pub fn extend(&mut self, specs: impl IntoIterator<Item = OrderBy>) {
        self.orderings.extend(specs);
    }

    /// Returns the accumulated specs.
    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    /// Returns `true` if no spec has been added.
    pub fn is_empty(&self) -> bool {
        self.orderings.is_empty()
    }

    /// Renders the wire form.
    ///
    /// A single spec is rendered bare. Two or more are wrapped as
    /// `[ spec, spec ]`. Returns `None` when empty.
    pub fn render(&self) -> Option<String> {
        match self.orderings.as_slice() {
            [] => None,
            [single] => Some(single.to_string()),
            many => {
                let parts: Vec<String> = many.iter().map(ToString::to_string).collect();
                Some(format!("[ {} ]", parts.join(", ")))
            }
        }
    }
}
