//! The oracle boundary.
//!
//! An [`Oracle`] is the external, nondeterministic judgment service: one
//! call in, one response string out. It may itself be wrapped by an external
//! agreement protocol that reconciles several invocations before answering;
//! the council does not care which, it only parses what comes back.
//!
//! [`StaticOracle`] and [`ScriptedOracle`] are deterministic stand-ins for
//! offline runs and tests. Both keep a log of the prompts they received.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::OracleError;

/// An external judgment-producing service.
///
/// Implementations must be shareable across tasks: independent panels
/// invoke the same oracle concurrently.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Returns the name of this oracle, for logs.
    fn name(&self) -> &str;

    /// Requests one judgment for the rendered prompt.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if no response could be obtained. Callers
    /// treat that exactly like an unparseable response.
    async fn invoke(&self, prompt: &str) -> Result<String, OracleError>;
}

#[derive(Debug, Default)]
struct PromptLog(Mutex<Vec<String>>);

impl PromptLog {
    fn push(&self, prompt: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Oracle that answers every prompt with the same text.
///
/// # Example
///
/// ```rust
/// use appeal_council::{Oracle, StaticOracle};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let oracle = StaticOracle::new("B");
/// assert_eq!(oracle.invoke("anything").await.unwrap(), "B");
/// assert_eq!(oracle.calls(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct StaticOracle {
    response: String,
    log: PromptLog,
}

impl StaticOracle {
    /// Creates an oracle that always returns `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            log: PromptLog::default(),
        }
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.log.len()
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.log.snapshot()
    }
}

#[async_trait]
impl Oracle for StaticOracle {
    fn name(&self) -> &str {
        "static"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        self.log.push(prompt);
        Ok(self.response.clone())
    }
}

/// Oracle that cycles through a fixed list of responses.
///
/// Invocation `n` receives `responses[n % len]`. With an empty list every
/// call fails, which is useful for exercising the fallback path.
#[derive(Debug)]
pub struct ScriptedOracle {
    responses: Vec<String>,
    cursor: AtomicUsize,
    log: PromptLog,
}

impl ScriptedOracle {
    /// Creates an oracle replaying `responses` in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
            log: PromptLog::default(),
        }
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.log.len()
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.log.snapshot()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        self.log.push(prompt);
        if self.responses.is_empty() {
            return Err(OracleError("no scripted responses".to_string()));
        }
        let n = self.cursor.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses[n % self.responses.len()].clone())
    }
}
