use core::{any::Any, fmt};

/// Consumes items drained by a [`BufferedProcessor`].
///
/// The handler is called exactly once per enqueued item, from the single
/// running processing pass. It may fail by returning an error or by
/// panicking; either way the failure is reported and the pass moves on to the
/// next item. Failed items are not retried.
///
/// Implemented for every `Fn(T) -> Result<(), E>` closure.
///
/// [`BufferedProcessor`]: crate::BufferedProcessor
pub trait Handler<T>: Send + Sync + 'static {
    /// The error type returned for a failed item.
    type Error: Send + 'static;

    /// Processes a single item.
    ///
    /// # Errors
    ///
    /// Any error is forwarded to the processor's [`ErrorReporter`].
    fn handle(&self, item: T) -> Result<(), Self::Error>;
}

impl<T, E, F> Handler<T> for F
where
    F: Fn(T) -> Result<(), E> + Send + Sync + 'static,
    E: Send + 'static,
{
    type Error = E;

    fn handle(&self, item: T) -> Result<(), E> {
        self(item)
    }
}

/// Why the handler failed on an item.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError<E> {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(E),
    /// The handler panicked. Holds the panic message when it was a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl<E> ProcessError<E> {
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("non-string panic payload"));
        Self::Panicked(message)
    }
}

/// Receives handler failures, together with the processor's name.
///
/// Implemented for every `Fn(&str, &ProcessError<E>)` closure. The default is
/// [`LogReporter`].
pub trait ErrorReporter<E>: Send + Sync + 'static {
    fn report(&self, name: &str, error: &ProcessError<E>);
}

impl<E, F> ErrorReporter<E> for F
where
    F: Fn(&str, &ProcessError<E>) + Send + Sync + 'static,
{
    fn report(&self, name: &str, error: &ProcessError<E>) {
        self(name, error);
    }
}

/// Reports handler failures as `tracing` error events.
///
/// Without the `tracing` feature failures are only counted in
/// [`ProcessorStats::failed`](crate::ProcessorStats::failed).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl<E: fmt::Display> ErrorReporter<E> for LogReporter {
    fn report(&self, _name: &str, _error: &ProcessError<E>) {
        #[cfg(feature = "tracing")]
        tracing::error!(processor = _name, error = %_error, "failed to process item");
    }
}
