//! Types used to describe the declared shape of schema objects.

use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools as _;

/// Declared type of a field or argument, e.g. `[Edge]` or `PageInfo!`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TypeRef {
    /// A nullable named type, e.g. `String`.
    Named(&'static str),

    /// A nullable list type, e.g. `[String]`.
    ///
    /// The list itself is what's nullable, the containing type might be
    /// non-null.
    List(Box<TypeRef>),

    /// A non-null wrapper, e.g. `String!` or `[Int]!`.
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Creates a nullable named [`TypeRef`].
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self::Named(name)
    }

    /// Wraps this [`TypeRef`] into a nullable list.
    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Wraps this [`TypeRef`] into a non-null one. Idempotent.
    #[must_use]
    pub fn non_null(self) -> Self {
        match self {
            t @ Self::NonNull(_) => t,
            t => Self::NonNull(Box::new(t)),
        }
    }

    /// Checks whether a `null` is forbidden at this position.
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn innermost_name(&self) -> &'static str {
        match self {
            Self::Named(n) => n,
            Self::List(t) | Self::NonNull(t) => t.innermost_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::List(t) => write!(f, "[{t}]"),
            Self::NonNull(t) => write!(f, "{t}!"),
        }
    }
}

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum DeprecationStatus {
    /// The field is not deprecated.
    #[default]
    Current,
    /// The field is deprecated, with an optional reason.
    Deprecated(Option<String>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::Deprecated(_))
    }

    /// An optional reason for the deprecation, or none if `Current`.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// Metadata for an argument to a field.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentMeta {
    #[doc(hidden)]
    pub name: &'static str,
    #[doc(hidden)]
    pub arg_type: TypeRef,
}

impl ArgumentMeta {
    /// Checks whether the argument must always be provided.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.arg_type.is_non_null()
    }
}

/// Metadata for a field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMeta {
    #[doc(hidden)]
    pub name: &'static str,
    #[doc(hidden)]
    pub description: Option<String>,
    #[doc(hidden)]
    pub arguments: Vec<ArgumentMeta>,
    #[doc(hidden)]
    pub field_type: TypeRef,
    #[doc(hidden)]
    pub deprecation_status: DeprecationStatus,
}

impl FieldMeta {
    /// Creates a new [`FieldMeta`] without arguments.
    #[must_use]
    pub fn new(name: &'static str, field_type: TypeRef) -> Self {
        Self {
            name,
            description: None,
            arguments: Vec::new(),
            field_type,
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Returns true if the field is built-in to GraphQL.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("__")
    }

    /// Looks up an argument by its name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&ArgumentMeta> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            let args = self
                .arguments
                .iter()
                .map(|a| format!("{}: {}", a.name, a.arg_type))
                .join(", ");
            write!(f, "({args})")?;
        }
        write!(f, ": {}", self.field_type)
    }
}

/// Object type metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMeta {
    #[doc(hidden)]
    pub name: &'static str,
    #[doc(hidden)]
    pub description: Option<String>,
    #[doc(hidden)]
    pub fields: IndexMap<&'static str, FieldMeta>,
}

impl ObjectMeta {
    /// Looks up a field by its name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }
}
