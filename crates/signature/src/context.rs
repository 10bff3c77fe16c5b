use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

type ContextValue = Arc<dyn Any + Send + Sync>;

static BACKGROUND: LazyLock<Context> = LazyLock::new(|| {
    Context(Arc::new(Node {
        parent: None,
        kind: Kind::Background,
        token: CancellationToken::new(),
        deadline: None,
    }))
});

enum Kind {
    Background,
    Value { key: String, value: ContextValue },
    Cancel,
    Deadline,
}

struct Node {
    parent: Option<Context>,
    kind: Kind,
    token: CancellationToken,
    deadline: Option<DateTime<Utc>>,
}

/// Cancellable, value-bearing execution context handed down to signing
/// collaborators.
///
/// Contexts form a tree: every derived context keeps its parent, inherits
/// its values, deadline and cancellation, and may add one of its own.
/// Handles are cheap to clone and compare equal only when they point at the
/// same context.
#[derive(Clone)]
pub struct Context(Arc<Node>);

/// Cancels the context it was returned with, and all contexts derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Context {
    /// The root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        BACKGROUND.clone()
    }

    pub fn is_background(&self) -> bool {
        matches!(self.0.kind, Kind::Background)
    }

    pub fn with_value<V>(&self, key: impl Into<String>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.derive(
            Kind::Value {
                key: key.into(),
                value: Arc::new(value),
            },
            self.0.token.clone(),
            self.0.deadline,
        )
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = self.0.token.child_token();
        let handle = CancelHandle {
            token: token.clone(),
        };
        (self.derive(Kind::Cancel, token, self.0.deadline), handle)
    }

    /// Derives a context that is done once the wall clock reaches `deadline`.
    ///
    /// A parent deadline that is earlier wins.
    pub fn with_deadline(&self, deadline: DateTime<Utc>) -> (Self, CancelHandle) {
        let effective = match self.0.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        let token = self.0.token.child_token();
        let handle = CancelHandle {
            token: token.clone(),
        };
        (self.derive(Kind::Deadline, token, Some(effective)), handle)
    }

    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        let deadline = TimeDelta::from_std(timeout)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        match deadline {
            Some(deadline) => self.with_deadline(deadline),
            // Too far out to represent; behaves like a plain cancel context.
            None => self.with_cancel(),
        }
    }

    fn derive(
        &self,
        kind: Kind,
        token: CancellationToken,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Context(Arc::new(Node {
            parent: Some(self.clone()),
            kind,
            token,
            deadline,
        }))
    }

    /// Looks `key` up, starting at this context and walking towards the root.
    pub fn value(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        let mut node = &self.0;
        loop {
            if let Kind::Value { key: k, value } = &node.kind {
                if k == key {
                    return Some(&**value);
                }
            }
            node = &node.parent.as_ref()?.0;
        }
    }

    pub fn value_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.value(key)?.downcast_ref::<T>()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.0.deadline
    }

    /// `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        if self.0.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.0.deadline {
            Some(deadline) if Utc::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for the background context.
    pub async fn done(&self) -> ContextError {
        let Some(deadline) = self.0.deadline else {
            self.0.token.cancelled().await;
            return ContextError::Canceled;
        };
        let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            biased;
            _ = self.0.token.cancelled() => ContextError::Canceled,
            _ = tokio::time::sleep(remaining) => ContextError::DeadlineExceeded,
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Context {}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.0.parent {
            write!(f, "{parent}.")?;
        }
        match &self.0.kind {
            Kind::Background => f.write_str("context.Background"),
            Kind::Value { key, .. } => write!(f, "WithValue({key})"),
            Kind::Cancel => f.write_str("WithCancel"),
            Kind::Deadline => match self.0.deadline {
                Some(deadline) => write!(f, "WithDeadline({})", deadline.to_rfc3339()),
                None => f.write_str("WithDeadline"),
            },
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.to_string()).finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
