//! One-shot ordering gate for the resolved interpreter path.
//!
//! The CLI surface lets the interpreter flag and the verb flag be handled
//! by independent tasks; the gate guarantees "interpreter resolved
//! happens-before any entry is built" without flag-ordering discipline.

use std::path::PathBuf;

use tokio::sync::oneshot;

use pycron_core::PycronError;

/// Resolving half. Dropping it without calling [`GateResolver::resolve`]
/// leaves the gate permanently unresolved.
pub struct GateResolver {
    tx: oneshot::Sender<PathBuf>,
}

impl GateResolver {
    /// Set the interpreter path. Consumes the resolver: single assignment.
    pub fn resolve(self, interpreter: PathBuf) {
        // The waiter may already be gone when its operation was aborted.
        let _ = self.tx.send(interpreter);
    }
}

/// Waiting half, consumed by the verb task.
pub struct InterpreterGate {
    rx: oneshot::Receiver<PathBuf>,
}

impl InterpreterGate {
    /// Block until the interpreter is resolved. A dropped resolver means
    /// no interpreter will ever arrive.
    pub async fn await_interpreter(self) -> Result<PathBuf, PycronError> {
        self.rx.await.map_err(|_| PycronError::InterpreterUnresolved)
    }
}

/// Create a connected resolver/waiter pair.
pub fn gate() -> (GateResolver, InterpreterGate) {
    let (tx, rx) = oneshot::channel();
    (GateResolver { tx }, InterpreterGate { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gate_delivers_interpreter() {
        let (resolver, waiter) = gate();
        resolver.resolve(PathBuf::from("/usr/bin/python3"));
        let path = waiter.await_interpreter().await.unwrap();
        assert_eq!(path, PathBuf::from("/usr/bin/python3"));
    }

    #[tokio::test]
    async fn test_dropped_resolver_surfaces_missing_interpreter() {
        let (resolver, waiter) = gate();
        drop(resolver);
        assert!(matches!(
            waiter.await_interpreter().await,
            Err(PycronError::InterpreterUnresolved)
        ));
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_resolved() {
        let (resolver, waiter) = gate();
        let handle = tokio::spawn(async move { waiter.await_interpreter().await });
        tokio::task::yield_now().await;
        resolver.resolve(PathBuf::from("/bin/py"));
        let path = handle.await.unwrap().unwrap();
        assert_eq!(path, PathBuf::from("/bin/py"));
    }
}
