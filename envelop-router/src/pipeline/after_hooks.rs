use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

use crate::error::InstrumentationError;
use crate::plugin::AfterHook;

/// After hooks collected during a before phase, drained last in first out.
pub(crate) struct AfterHookStack<T> {
    hooks: Vec<(&'static str, AfterHook<T>)>,
}

impl<T> AfterHookStack<T> {
    pub(crate) fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub(crate) fn push(&mut self, plugin: &'static str, hook: AfterHook<T>) {
        self.hooks.push((plugin, hook));
    }

    /// Runs every hook against `result`, the most recently pushed first.
    ///
    /// A failing hook is reported and the remaining hooks still run.
    pub(crate) fn unwind(mut self, result: &T) {
        while let Some((plugin, hook)) = self.hooks.pop() {
            let outcome = catch_unwind(AssertUnwindSafe(|| hook.call(result)));
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            let error = InstrumentationError { plugin, reason };
            tracing::warn!(plugin, error = %error, "after hook failed");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "after hook panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn unwinds_in_reverse_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut stack = AfterHookStack::new();
        for name in ["first", "second", "third"] {
            let seen = seen.clone();
            stack.push(
                name,
                AfterHook::new(move |value: &u32| {
                    seen.lock().push(format!("{name}:{value}"));
                    Ok(())
                }),
            );
        }
        stack.unwind(&7);
        assert_eq!(*seen.lock(), vec!["third:7", "second:7", "first:7"]);
    }

    #[test]
    #[traced_test]
    fn failures_are_isolated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut stack = AfterHookStack::new();
        let outer = seen.clone();
        stack.push(
            "outer",
            AfterHook::new(move |_: &()| {
                outer.lock().push("outer");
                Ok(())
            }),
        );
        stack.push("erroring", AfterHook::new(|_: &()| Err("boom".into())));
        stack.push(
            "panicking",
            AfterHook::new(|_: &()| panic!("instrumentation exploded")),
        );
        stack.unwind(&());
        assert_eq!(*seen.lock(), vec!["outer"]);
        assert!(logs_contain(
            "instrumentation hook of plugin 'erroring' failed: boom"
        ));
        assert!(logs_contain(
            "instrumentation hook of plugin 'panicking' failed: instrumentation exploded"
        ));
    }
}
