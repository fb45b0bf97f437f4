//! Type-erased host callables.
//!
//! Host members (methods, constructors, field accessors, extension
//! functions) are registered as [`NativeFn`]s: `Arc`-wrapped closures
//! taking an optional receiver plus already-promoted argument values.
//! The `Arc` makes them cheap to clone into compiled trees and safe to
//! invoke from any thread.

use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::value::Value;

/// Result of a native call.
pub type NativeResult = Result<Value, RuntimeError>;

/// Trait for callable host functions.
///
/// `recv` is `Some` for instance members and `None` for static members,
/// constructors, and free extension functions (whose receiver arrives as
/// the first argument instead).
pub trait NativeCallable: Send + Sync {
    fn call(&self, recv: Option<&Value>, args: &[Value]) -> NativeResult;
}

impl<F> NativeCallable for F
where
    F: Fn(Option<&Value>, &[Value]) -> NativeResult + Send + Sync,
{
    fn call(&self, recv: Option<&Value>, args: &[Value]) -> NativeResult {
        self(recv, args)
    }
}

/// A type-erased native function.
pub struct NativeFn {
    inner: Arc<dyn NativeCallable>,
}

impl NativeFn {
    /// Wrap a callable.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap a callable that ignores its receiver (static members, free
    /// functions).
    pub fn from_static<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> NativeResult + Send + Sync + 'static,
    {
        Self::new(move |_recv: Option<&Value>, args: &[Value]| f(args))
    }

    /// Call the function.
    pub fn call(&self, recv: Option<&Value>, args: &[Value]) -> NativeResult {
        self.inner.call(recv, args)
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_callable() {
        let add = NativeFn::from_static(|args: &[Value]| match (&args[0], &args[1]) {
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a + b)),
            _ => Err(RuntimeError::Host {
                message: "bad args".into(),
            }),
        });
        let out = add.call(None, &[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(out, Value::I32(5));
    }

    #[test]
    fn receiver_is_forwarded() {
        let echo = NativeFn::new(|recv: Option<&Value>, _args: &[Value]| {
            Ok(recv.cloned().unwrap_or(Value::Null))
        });
        let out = echo.call(Some(&Value::Bool(true)), &[]).unwrap();
        assert_eq!(out, Value::Bool(true));
    }
}
