//! Qualified service identifiers.
//!
//! A service is addressed by an id plus the origin it was registered from.
//! Dependency declarations may leave the origin open with a wildcard, which
//! participates in *matching* but is still a distinct value for equality:
//! `cache@*` and `cache@remote` match each other, but are not equal.

use std::fmt;

use crate::error::{LifecycleError, LifecycleResult};

/// Separator between the id and origin parts of the textual form.
pub const SEPARATOR: char = '@';

/// Textual form of the wildcard origin.
pub const WILDCARD: &str = "*";

/// Origin assumed when the textual form carries no `@origin` suffix.
pub const LOCAL: &str = "local";

/// Where a service registration came from.
///
/// `Any` is the wildcard used by dependency declarations that accept a
/// matching service from any origin. It is a real variant, not a sentinel
/// string, so equality and hashing treat it as its own value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Matches any concrete origin during edge lookup.
    Any,
    /// A concrete origin such as `local` or `remote`.
    Named(String),
}

impl Origin {
    /// Creates a concrete origin.
    pub fn named(origin: impl Into<String>) -> Self {
        Origin::Named(origin.into())
    }

    /// The default origin for services registered without one.
    pub fn local() -> Self {
        Origin::Named(LOCAL.to_string())
    }

    /// True for the wildcard origin.
    pub fn is_any(&self) -> bool {
        matches!(self, Origin::Any)
    }

    /// Wildcard-aware matching: equal origins match, and the wildcard
    /// matches anything from either side.
    pub fn matches(&self, other: &Origin) -> bool {
        self.is_any() || other.is_any() || self == other
    }

    /// Textual form (`*` for the wildcard).
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Any => WILDCARD,
            Origin::Named(origin) => origin,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one service instance: logical id plus origin.
///
/// Two ids are *edge-matching* when their id parts are equal and the origins
/// match under the wildcard rule. Exact equality (`==`, hashing) requires
/// both parts equal, with the wildcard counting as its own value — lookup
/// tables keyed by `QualifiedServiceId` keep wildcard and concrete entries
/// apart.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::QualifiedServiceId;
///
/// let declared = QualifiedServiceId::parse("cache@*").unwrap();
/// let concrete = QualifiedServiceId::parse("cache@remote").unwrap();
/// let local = QualifiedServiceId::parse("cache").unwrap();
///
/// assert!(declared.matches(&concrete));
/// assert!(declared.matches(&local));
/// assert_ne!(declared, concrete);
/// assert_eq!(local.origin().as_str(), "local");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedServiceId {
    id: String,
    origin: Origin,
}

impl QualifiedServiceId {
    /// Creates an identifier from its two parts.
    pub fn new(id: impl Into<String>, origin: Origin) -> Self {
        Self { id: id.into(), origin }
    }

    /// Creates an identifier with the default `local` origin.
    pub fn local(id: impl Into<String>) -> Self {
        Self::new(id, Origin::local())
    }

    /// Creates an identifier with the wildcard origin.
    pub fn any(id: impl Into<String>) -> Self {
        Self::new(id, Origin::Any)
    }

    /// Parses the combined `id@origin` form.
    ///
    /// The origin part is optional (`"db"` parses as `db@local`) and `*`
    /// selects the wildcard. An empty id or empty origin part is rejected.
    pub fn parse(text: &str) -> LifecycleResult<Self> {
        let mut parts = text.splitn(2, SEPARATOR);
        let id = parts.next().unwrap_or_default();
        if id.is_empty() {
            return Err(LifecycleError::InvalidServiceId(text.to_string()));
        }
        let origin = match parts.next() {
            None => Origin::local(),
            Some("") => return Err(LifecycleError::InvalidServiceId(text.to_string())),
            Some(WILDCARD) => Origin::Any,
            Some(origin) => Origin::named(origin),
        };
        Ok(Self { id: id.to_string(), origin })
    }

    /// The logical service id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The origin part.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Edge-matching rule used for dependency lookup: ids equal, origins
    /// equal or either side wildcard.
    pub fn matches(&self, other: &QualifiedServiceId) -> bool {
        self.id == other.id && self.origin.matches(&other.origin)
    }
}

impl fmt::Display for QualifiedServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.id, SEPARATOR, self.origin)
    }
}
