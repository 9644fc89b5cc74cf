//! Resolution of selection sets against schema objects.

mod cancellation;
mod config;

use std::{
    any::Any,
    fmt,
    pin::pin,
    sync::{Arc, PoisonError, RwLock},
};

use derive_more::with_trait::Display;
use futures::{
    FutureExt as _, Stream,
    future::{self, BoxFuture, Either},
    stream::{self, FuturesOrdered, StreamExt as _},
};
use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap as _};
use tracing::{Instrument as _, debug, trace_span, warn};

use crate::{
    GraphQLError,
    ast::{Field, Selection},
    schema::{meta::TypeRef, model::Registry},
    types::base::{Arguments, ObjectRef},
    value::{Object, Value},
};

pub use self::{
    cancellation::{Cancellation, Cancelled},
    config::{DEFAULT_MAX_DEPTH, ExecutionConfig, MAX_SUPPORTED_DEPTH},
};

/// Error type for errors that occur during field resolution
///
/// Any type implementing [`Display`] converts into a field-level
/// [`FieldError`], so accessors may propagate their own errors with `?`:
///
/// ```rust
/// # use juniper_service::FieldResult;
/// fn parse_size(raw: &str) -> FieldResult<i32> {
///     Ok(raw.parse::<i32>()?)
/// }
/// # assert!(parse_size("12").is_ok());
/// # assert!(parse_size("twelve").is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    kind: ErrorKind,
    extensions: Value,
}

impl<T: Display> From<T> for FieldError {
    fn from(e: T) -> Self {
        Self::with_kind(ErrorKind::Field, e)
    }
}

impl FieldError {
    /// Construct a new [`FieldError`] with additional data.
    ///
    /// You can use the [`graphql_value!`] macro for construction:
    /// ```rust
    /// use juniper_service::{graphql_value, FieldError};
    ///
    /// # let _ =
    /// FieldError::new(
    ///     "Could not open connection to the database",
    ///     graphql_value!({"internal_error": "Connection refused"}),
    /// );
    /// ```
    ///
    /// The `extensions` parameter will be added to the `"extensions"` field of
    /// the `"errors"` object in the response. If it is [`Value::Null`], no
    /// extra data will be included.
    ///
    /// [`graphql_value!`]: crate::graphql_value
    #[must_use]
    pub fn new<T: Display>(e: T, extensions: Value) -> Self {
        Self {
            message: e.to_string(),
            kind: ErrorKind::Field,
            extensions,
        }
    }

    fn with_kind(kind: ErrorKind, e: impl Display) -> Self {
        Self {
            message: e.to_string(),
            kind,
            extensions: Value::null(),
        }
    }

    /// Field the accessor of the provided `Type.field` coordinate does not
    /// serve.
    #[must_use]
    pub fn not_implemented(coordinate: &str) -> Self {
        Self::with_kind(
            ErrorKind::NotImplemented,
            format!("Field `{coordinate}` is not implemented"),
        )
    }

    /// Field not declared on the provided type.
    #[must_use]
    pub fn unknown_field(type_name: &str, field_name: &str) -> Self {
        Self::with_kind(
            ErrorKind::UnknownField,
            format!("Unknown field `{field_name}` on type `{type_name}`"),
        )
    }

    /// Non-null argument absent from the argument bag.
    #[must_use]
    pub fn missing_argument(name: &str) -> Self {
        Self::with_kind(
            ErrorKind::MissingArgument,
            format!("Missing required argument `{name}`"),
        )
    }

    /// Argument present, but unusable.
    #[must_use]
    pub fn invalid_argument(message: impl Display) -> Self {
        Self::with_kind(
            ErrorKind::InvalidArgument,
            format!("Invalid argument: {message}"),
        )
    }

    /// Pagination cursor matching no element.
    #[must_use]
    pub fn invalid_cursor(cursor: &str) -> Self {
        Self::with_kind(ErrorKind::InvalidCursor, format!("Invalid cursor `{cursor}`"))
    }

    /// Request cancelled, or its deadline elapsed.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::with_kind(ErrorKind::Cancelled, "Request was cancelled")
    }

    /// Selection nested deeper than the provided maximum.
    #[must_use]
    pub fn depth_limit(max_depth: usize) -> Self {
        Self::with_kind(
            ErrorKind::DepthLimitExceeded,
            format!("Selection is nested deeper than {max_depth} levels"),
        )
    }

    /// Violated framework invariant. Aborts the whole request.
    #[must_use]
    pub fn invariant(message: impl Display) -> Self {
        Self::with_kind(ErrorKind::Invariant, message)
    }

    /// Returns the message of this [`FieldError`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the [`ErrorKind`] of this [`FieldError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the additional data of this [`FieldError`].
    #[must_use]
    pub fn extensions(&self) -> &Value {
        &self.extensions
    }

    /// Shortcut for `self.kind().severity()`.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

/// Cause of a [`FieldError`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Failure reported by an accessor.
    #[display("FIELD_ERROR")]
    Field,

    /// Accessor not served by the object variant.
    #[display("NOT_IMPLEMENTED")]
    NotImplemented,

    /// Field not declared on the object type.
    #[display("UNKNOWN_FIELD")]
    UnknownField,

    /// Required argument absent.
    #[display("MISSING_ARGUMENT")]
    MissingArgument,

    /// Argument of an unexpected shape or value.
    #[display("INVALID_ARGUMENT")]
    InvalidArgument,

    /// Pagination cursor matching no element.
    #[display("INVALID_CURSOR")]
    InvalidCursor,

    /// Request cancelled or timed out.
    #[display("CANCELLED")]
    Cancelled,

    /// Selection nested too deeply.
    #[display("DEPTH_LIMIT_EXCEEDED")]
    DepthLimitExceeded,

    /// Framework invariant violated.
    #[display("INVARIANT")]
    Invariant,
}

impl ErrorKind {
    /// Returns the [`Severity`] of errors of this kind.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::Field | Self::NotImplemented => Severity::Field,
            Self::UnknownField
            | Self::MissingArgument
            | Self::InvalidArgument
            | Self::InvalidCursor
            | Self::Cancelled
            | Self::DepthLimitExceeded => Severity::Request,
            Self::Invariant => Severity::Fatal,
        }
    }
}

/// How far a [`FieldError`] reaches.
///
/// [`Severity::Field`] and [`Severity::Request`] errors null the failed field
/// only, while a [`Severity::Fatal`] one aborts the whole request.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    /// Data-level failure of a single field.
    Field,
    /// Malformed request reaching a single field.
    Request,
    /// Broken framework invariant.
    Fatal,
}

/// The result of resolving the value of a field of type `T`
pub type FieldResult<T> = Result<T, FieldError>;

/// The result of resolving an unspecified field
pub type ExecutionResult = Result<Value, FieldError>;

/// Segment of a [`FieldPath`].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Response key of a field.
    Field(String),
    /// Position in a list.
    Index(usize),
}

/// Location of a field in the response, e.g. `files.edges[1].node`.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Returns the path of the root object.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the path of the field with the provided response key.
    #[must_use]
    pub fn field(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Field(key.into()));
        path
    }

    /// Returns the path of the provided list position.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Index(index));
        path
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Checks whether this is the path of the root object.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Field(key) => write!(f, ".{key}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl<'a> FromIterator<&'a str> for FieldPath {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| match s.parse() {
                    Ok(idx) => PathSegment::Index(idx),
                    Err(_) => PathSegment::Field(s.into()),
                })
                .collect(),
        )
    }
}

/// Error type for errors that occur during query execution
///
/// All execution errors contain the path of the field that failed to resolve.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    path: FieldPath,
    error: FieldError,
}

impl ExecutionError {
    #[doc(hidden)]
    #[must_use]
    pub fn new(path: FieldPath, error: FieldError) -> Self {
        Self { path, error }
    }

    /// The path of the failed field.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The error itself.
    #[must_use]
    pub fn error(&self) -> &FieldError {
        &self.error
    }
}

impl Serialize for ExecutionError {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(3))?;

        map.serialize_key("message")?;
        map.serialize_value(self.error.message())?;

        map.serialize_key("path")?;
        map.serialize_value(&self.path)?;

        if !self.error.extensions().is_null() {
            map.serialize_key("extensions")?;
            map.serialize_value(self.error.extensions())?;
        }

        map.end()
    }
}

/// Everything a resolver learns about the field it resolves.
///
/// Created by the executor once per field, read-only for the resolver.
#[derive(Clone, Default)]
pub struct ResolutionContext {
    arguments: Arguments,
    path: FieldPath,
    cancellation: Cancellation,
    depth: usize,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl ResolutionContext {
    /// Creates a new [`ResolutionContext`] holding the provided arguments.
    #[must_use]
    pub fn new(arguments: Arguments) -> Self {
        Self {
            arguments,
            ..Self::default()
        }
    }

    /// Sets the response path of the field.
    #[must_use]
    pub fn with_path(mut self, path: FieldPath) -> Self {
        self.path = path;
        self
    }

    /// Sets the [`Cancellation`] of the request.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Sets the nesting depth of the field.
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Attaches request-scoped data, retrievable with
    /// [`ResolutionContext::data()`].
    #[must_use]
    pub fn with_data<T: Any + Send + Sync>(self, data: Arc<T>) -> Self {
        self.with_shared_data(Some(data))
    }

    fn with_shared_data(mut self, data: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        self.data = data;
        self
    }

    /// Returns the arguments of the field.
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns the response path of the field.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the [`Cancellation`] of the request.
    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Checks whether the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails if the request has been cancelled.
    pub fn check_cancelled(&self) -> FieldResult<()> {
        self.cancellation.check()
    }

    /// Returns the nesting depth of the field, `1` for fields of the root
    /// object.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the request-scoped data, if it is a `T`.
    #[must_use]
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|d| d.downcast_ref())
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("arguments", &self.arguments)
            .field("path", &self.path)
            .field("cancellation", &self.cancellation)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Query execution engine
///
/// Walks an already parsed selection set, resolving every field through the
/// [`Registry`] and completing placeholders into objects. Failed fields are
/// nulled and reported as [`ExecutionError`]s, with nulls of non-null fields
/// propagating to the nearest nullable ancestor.
pub struct Executor<'r> {
    registry: &'r Registry,
    config: ExecutionConfig,
    cancellation: Cancellation,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<'r> Executor<'r> {
    /// Creates a new [`Executor`] with the default [`ExecutionConfig`].
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            config: ExecutionConfig::default(),
            cancellation: Cancellation::new(),
            data: None,
        }
    }

    /// Replaces the [`ExecutionConfig`].
    #[must_use]
    pub fn config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the [`Cancellation`] of requests.
    #[must_use]
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Attaches request-scoped data handed to every resolver.
    #[must_use]
    pub fn data<T: Any + Send + Sync>(mut self, data: Arc<T>) -> Self {
        self.data = Some(data);
        self
    }

    /// Resolves the provided `selection_set` against the `root` object.
    ///
    /// Returns the completed response along with the errors of the nulled
    /// fields, ordered by path, or fails as a whole on a broken framework
    /// invariant.
    pub async fn execute(
        &self,
        root: &ObjectRef,
        selection_set: &[Selection],
    ) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
        let cancellation = match self.config.request_timeout() {
            Some(timeout) => self.cancellation.with_timeout(timeout),
            None => self.cancellation.clone(),
        };
        let run = Run {
            registry: self.registry,
            config: &self.config,
            cancellation,
            data: self.data.clone(),
            errors: RwLock::new(Vec::new()),
        };

        let value = match run
            .resolve_selection_set(root.clone(), selection_set.iter().collect(), FieldPath::root(), 1)
            .await
        {
            Ok(v) => v,
            Err(Propagation::Null) => Value::null(),
            Err(Propagation::Fatal(e)) => return Err(e),
        };

        let mut errors = run
            .errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        Ok((value, errors))
    }
}

/// Resolves the provided `selection_set` against the `root` object with the
/// default [`ExecutionConfig`].
pub async fn execute(
    registry: &Registry,
    root: &ObjectRef,
    selection_set: &[Selection],
) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
    Executor::new(registry).execute(root, selection_set).await
}

/// Reason a value could not be completed.
enum Propagation {
    /// Nulled by a failure already recorded, to be caught by the nearest
    /// nullable position.
    Null,
    /// Request aborted.
    Fatal(GraphQLError),
}

type Completion = Result<Value, Propagation>;

/// State of a single [`Executor::execute()`] call.
struct Run<'a> {
    registry: &'a Registry,
    config: &'a ExecutionConfig,
    cancellation: Cancellation,
    data: Option<Arc<dyn Any + Send + Sync>>,
    errors: RwLock<Vec<ExecutionError>>,
}

impl<'a> Run<'a> {
    fn resolve_selection_set(
        &'a self,
        object: ObjectRef,
        selections: Vec<&'a Selection>,
        path: FieldPath,
        depth: usize,
    ) -> BoxFuture<'a, Completion> {
        async move {
            if self.registry.meta_of(&object).is_none() {
                return Err(self.fatal(format!(
                    "type `{}` is not registered",
                    object.type_name(),
                )));
            }

            let mut grouped = IndexMap::new();
            collect_fields(object.type_name(), selections, &mut grouped);

            let object = &object;
            let resolving = grouped.into_iter().map(|(key, fields)| {
                let path = path.field(key);
                async move { (key, self.resolve_field(object, fields, path, depth).await) }
            });

            if self.config.concurrent_fields {
                assemble(resolving.collect::<FuturesOrdered<_>>()).await
            } else {
                assemble(stream::iter(resolving).then(|f| f)).await
            }
        }
        .boxed()
    }

    async fn resolve_field(
        &'a self,
        object: &ObjectRef,
        fields: Vec<&'a Field>,
        path: FieldPath,
        depth: usize,
    ) -> Completion {
        let Some(&field) = fields.first() else {
            return Ok(Value::null());
        };
        let Some(meta) = self.registry.meta_of(object) else {
            return Err(self.fatal(format!(
                "type `{}` is not registered",
                object.type_name(),
            )));
        };
        let Some(field_meta) = meta.field_by_name(&field.name) else {
            self.push_error(path, FieldError::unknown_field(meta.name, &field.name));
            return Ok(Value::null());
        };

        let max_depth = self.config.effective_max_depth();
        let result = if depth > max_depth {
            Err(FieldError::depth_limit(max_depth))
        } else if let Err(e) = self.cancellation.check() {
            Err(e)
        } else {
            let ctx = ResolutionContext::new(field.arguments.clone())
                .with_path(path.clone())
                .with_depth(depth)
                .with_cancellation(self.cancellation.clone())
                .with_shared_data(self.data.clone());
            self.resolve_raw(object, &field.name, &ctx)
                .instrument(trace_span!(
                    "resolve_field",
                    object = meta.name,
                    field = field_meta.name,
                ))
                .await
        };

        match result {
            Ok(value) => {
                let selections = fields
                    .into_iter()
                    .flat_map(|f| &f.selection_set)
                    .collect();
                self.complete_value(&field_meta.field_type, value, selections, path, depth)
                    .await
            }
            Err(e) if e.severity() == Severity::Fatal => Err(self.fatal(e.message())),
            Err(e) => {
                debug!(%path, kind = %e.kind(), error = e.message(), "field resolution failed");
                self.push_error(path, e);
                if field_meta.field_type.is_non_null() {
                    Err(Propagation::Null)
                } else {
                    Ok(Value::null())
                }
            }
        }
    }

    async fn resolve_raw(
        &self,
        object: &ObjectRef,
        field_name: &str,
        ctx: &ResolutionContext,
    ) -> FieldResult<Value> {
        match self
            .registry
            .resolve_field(object, field_name, ctx)
            .into_settled()
        {
            Ok(res) => res,
            Err(pending) => match future::select(pending, self.cancellation.cancelled()).await {
                Either::Left((res, _)) => res,
                Either::Right(((), _)) => {
                    debug!(path = %ctx.path(), "pending field dropped on cancellation");
                    Err(FieldError::cancelled())
                }
            },
        }
    }

    /// Completes the `value` of a field of the declared type `ty`, catching
    /// propagated nulls at nullable positions.
    fn complete_value(
        &'a self,
        ty: &'a TypeRef,
        value: Value,
        selections: Vec<&'a Selection>,
        path: FieldPath,
        depth: usize,
    ) -> BoxFuture<'a, Completion> {
        async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    match self
                        .complete_inner(inner, value, selections, path.clone(), depth)
                        .await
                    {
                        Ok(v) if v.is_null() => {
                            self.push_error(
                                path,
                                FieldError::from("Cannot return null for non-nullable field"),
                            );
                            Err(Propagation::Null)
                        }
                        res => res,
                    }
                }
                ty => match self.complete_inner(ty, value, selections, path, depth).await {
                    Err(Propagation::Null) => Ok(Value::null()),
                    res => res,
                },
            }
        }
        .boxed()
    }

    async fn complete_inner(
        &'a self,
        ty: &'a TypeRef,
        value: Value,
        selections: Vec<&'a Selection>,
        path: FieldPath,
        depth: usize,
    ) -> Completion {
        match (ty, value) {
            (_, Value::Null) => Ok(Value::null()),
            (TypeRef::NonNull(_), v) => self.complete_value(ty, v, selections, path, depth).await,
            (TypeRef::List(item), Value::List(items)) => {
                let items = items.into_iter().enumerate().map(|(i, v)| {
                    self.complete_value(item, v, selections.clone(), path.index(i), depth)
                });
                let completed: Vec<_> = if self.config.concurrent_fields {
                    items.collect::<FuturesOrdered<_>>().collect().await
                } else {
                    stream::iter(items).then(|f| f).collect().await
                };

                let mut list = Vec::with_capacity(completed.len());
                let mut nulled = false;
                for c in completed {
                    match c {
                        Ok(v) => list.push(v),
                        Err(Propagation::Null) => nulled = true,
                        Err(fatal @ Propagation::Fatal(_)) => return Err(fatal),
                    }
                }
                if nulled {
                    Err(Propagation::Null)
                } else {
                    Ok(Value::list(list))
                }
            }
            (TypeRef::Named(_), Value::Instance(object)) => {
                self.resolve_selection_set(object, selections, path, depth + 1)
                    .await
            }
            (TypeRef::Named(_), v @ (Value::Scalar(_) | Value::Object(_))) => Ok(v),
            (ty, v) => {
                self.push_error(
                    path,
                    FieldError::from(format!("Expected a value of type `{ty}`, found: {v}")),
                );
                Err(Propagation::Null)
            }
        }
    }

    fn push_error(&self, path: FieldPath, error: FieldError) {
        self.errors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ExecutionError { path, error });
    }

    fn fatal(&self, message: impl Into<String>) -> Propagation {
        let message = message.into();
        warn!(error = %message, "request aborted on a broken invariant");
        Propagation::Fatal(GraphQLError::Invariant(message))
    }
}

/// Groups the fields of `selections` applying to `type_name` by response key,
/// flattening inline fragments.
fn collect_fields<'a>(
    type_name: &str,
    selections: impl IntoIterator<Item = &'a Selection>,
    out: &mut IndexMap<&'a str, Vec<&'a Field>>,
) {
    for selection in selections {
        match selection {
            Selection::Field(f) => out.entry(f.response_key()).or_default().push(f),
            Selection::InlineFragment(frag) => {
                if frag
                    .type_condition
                    .as_deref()
                    .is_none_or(|cond| cond == type_name)
                {
                    collect_fields(type_name, &frag.selection_set, out);
                }
            }
        }
    }
}

/// Builds an object out of completed fields, draining all of them unless one
/// aborts the request.
async fn assemble<'k>(fields: impl Stream<Item = (&'k str, Completion)>) -> Completion {
    let mut fields = pin!(fields);
    let mut object = Object::with_capacity(0);
    let mut nulled = false;

    while let Some((key, completion)) = fields.next().await {
        match completion {
            Ok(v) => {
                object.add_field(key, v);
            }
            Err(Propagation::Null) => nulled = true,
            Err(fatal @ Propagation::Fatal(_)) => return Err(fatal),
        }
    }

    if nulled {
        Err(Propagation::Null)
    } else {
        Ok(Value::object(object))
    }
}
