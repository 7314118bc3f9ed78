//! Common traits used across the kdfbridge crates

/// Values an `on_result` handler may produce.
///
/// Handlers unwrap the `Result` themselves, so `Result` is deliberately not in
/// this list: the awaited value of a handler-carrying future is always a plain
/// value.
pub trait NotResult {}

impl NotResult for bool {}
impl NotResult for usize {}
impl NotResult for String {}
impl<T> NotResult for Option<T> {}
