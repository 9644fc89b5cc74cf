use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{FutureExt as _, future::BoxFuture};

use crate::{
    executor::{FieldError, FieldResult},
    value::{IntoValue, Value},
};

/// Result of a typed field accessor: either settled right away or still
/// pending.
///
/// Accessors backed by in-memory data return a settled [`FieldFuture`] and
/// never allocate; accessors calling into an asynchronous data source wrap
/// their computation with [`FieldFuture::pending()`]. Either way the caller
/// sees a single [`Future`] yielding a [`FieldResult`], and continuations
/// attached with [`map()`], [`and_then()`] or [`into_value()`] run exactly
/// once, as soon as the value is available.
///
/// ```rust
/// # use juniper_service::{FieldFuture, Value};
/// # #[tokio::main]
/// # async fn main() {
/// let now = FieldFuture::ok(2).map(|n| n * 21);
/// assert!(now.is_settled());
///
/// let later = FieldFuture::pending(async { Ok(42) }).into_value();
/// assert!(!later.is_settled());
/// assert_eq!(later.await.ok(), Some(Value::scalar(42)));
/// # }
/// ```
///
/// [`and_then()`]: FieldFuture::and_then
/// [`into_value()`]: FieldFuture::into_value
/// [`map()`]: FieldFuture::map
#[must_use = "a `FieldFuture` does nothing unless awaited"]
pub struct FieldFuture<'a, T> {
    state: State<'a, T>,
}

enum State<'a, T> {
    /// Result is available. `None` once it has been taken by polling.
    Settled(Option<FieldResult<T>>),

    /// Computation is scheduled but has not produced a result yet.
    Pending(BoxFuture<'a, FieldResult<T>>),
}

impl<'a, T: Send + 'a> FieldFuture<'a, T> {
    /// Creates a settled [`FieldFuture`] holding the provided value.
    pub fn ok(value: T) -> Self {
        Self::from_result(Ok(value))
    }

    /// Creates a settled [`FieldFuture`] holding the provided failure.
    pub fn err(e: impl Into<FieldError>) -> Self {
        Self::from_result(Err(e.into()))
    }

    /// Creates a settled [`FieldFuture`] out of a synchronously computed
    /// result.
    pub fn from_result(result: FieldResult<T>) -> Self {
        Self {
            state: State::Settled(Some(result)),
        }
    }

    /// Creates a settled [`FieldFuture`] failing with a "not implemented"
    /// error for the given `Type.field` coordinate.
    pub fn not_implemented(coordinate: &str) -> Self {
        Self::err(FieldError::not_implemented(coordinate))
    }

    /// Creates a pending [`FieldFuture`] out of a deferred computation.
    ///
    /// The computation may itself await other [`FieldFuture`]s.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = FieldResult<T>> + Send + 'a,
    {
        Self {
            state: State::Pending(future.boxed()),
        }
    }

    /// Checks whether the result of this [`FieldFuture`] is already
    /// available.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::Settled(Some(_)))
    }

    /// Takes the result out of this [`FieldFuture`] if it is settled, or
    /// returns it back untouched otherwise.
    pub fn into_settled(self) -> Result<FieldResult<T>, Self> {
        match self.state {
            State::Settled(Some(result)) => Ok(result),
            state => Err(Self { state }),
        }
    }

    /// Attaches a continuation transforming the successful value.
    pub fn map<U, F>(self, f: F) -> FieldFuture<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        self.and_then_result(|res| res.map(f))
    }

    /// Attaches a continuation transforming the failure.
    pub fn map_err<F>(self, f: F) -> Self
    where
        F: FnOnce(FieldError) -> FieldError + Send + 'a,
    {
        self.and_then_result(|res| res.map_err(f))
    }

    /// Attaches a continuation producing another [`FieldFuture`] out of the
    /// successful value.
    ///
    /// Settled layers are collapsed eagerly, so chaining synchronous
    /// continuations never allocates.
    pub fn and_then<U, F>(self, f: F) -> FieldFuture<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> FieldFuture<'a, U> + Send + 'a,
    {
        match self.state {
            State::Settled(Some(Ok(v))) => f(v),
            State::Settled(Some(Err(e))) => FieldFuture::err(e),
            State::Settled(None) => FieldFuture::from_result(Err(polled_after_completion())),
            State::Pending(fut) => FieldFuture::pending(async move {
                let v = fut.await?;
                f(v).await
            }),
        }
    }

    /// Attaches the conversion into a [`Value`] as a continuation.
    pub fn into_value(self) -> FieldFuture<'a, Value>
    where
        T: IntoValue,
    {
        self.and_then_result(|res| res.and_then(IntoValue::into_value))
    }

    fn and_then_result<U, F>(self, f: F) -> FieldFuture<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(FieldResult<T>) -> FieldResult<U> + Send + 'a,
    {
        match self.state {
            State::Settled(Some(res)) => FieldFuture::from_result(f(res)),
            State::Settled(None) => FieldFuture::from_result(Err(polled_after_completion())),
            State::Pending(fut) => FieldFuture::pending(fut.map(f)),
        }
    }
}

fn polled_after_completion() -> FieldError {
    FieldError::invariant("`FieldFuture` was polled after completion")
}

// `T` is only ever moved out, never pinned.
impl<T> Unpin for FieldFuture<'_, T> {}

impl<T> Future for FieldFuture<'_, T> {
    type Output = FieldResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Settled(res) => {
                Poll::Ready(res.take().unwrap_or_else(|| Err(polled_after_completion())))
            }
            State::Pending(fut) => {
                let res = futures::ready!(fut.as_mut().poll(cx));
                this.state = State::Settled(None);
                Poll::Ready(res)
            }
        }
    }
}

impl<T> fmt::Debug for FieldFuture<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Settled(Some(Ok(_))) => "Ok",
            State::Settled(Some(Err(_))) => "Err",
            State::Settled(None) => "Taken",
            State::Pending(_) => "Pending",
        };
        f.debug_tuple("FieldFuture").field(&state).finish()
    }
}

impl<'a, T: Send + 'a> From<FieldResult<T>> for FieldFuture<'a, T> {
    fn from(result: FieldResult<T>) -> Self {
        Self::from_result(result)
    }
}
