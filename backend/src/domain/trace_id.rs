//! Correlation id shared by every log line and error of one request.
//!
//! Stored in a Tokio task local. Blocking threads do not inherit task locals,
//! so CPU-bound work must go through [`TraceId::spawn_blocking`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task::JoinHandle;
use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: TraceId;
}

/// UUID v4 naming one inbound request.
///
/// # Examples
/// ```
/// use user_service::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id = TraceId::generate();
/// let seen = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id of the request being handled, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Drive `fut` with `trace_id` as the current id.
    pub async fn scope<Fut: Future>(trace_id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(trace_id, fut).await
    }

    /// Run `work` on the blocking pool with the caller's id still current.
    pub fn spawn_blocking<F, R>(work: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let inherited = Self::current();
        tokio::task::spawn_blocking(move || match inherited {
            Some(id) => CURRENT.sync_scope(id, work),
            None => work(),
        })
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nothing_is_current_outside_a_request() {
        assert_eq!(TraceId::current(), None);
    }

    #[tokio::test]
    async fn blocking_work_sees_the_request_id() {
        let id = TraceId::generate();

        let seen = TraceId::scope(id, async {
            TraceId::spawn_blocking(TraceId::current).await
        })
        .await
        .expect("blocking task joins");

        assert_eq!(seen, Some(id));
    }

    #[tokio::test]
    async fn blocking_work_outside_a_request_has_no_id() {
        let seen = TraceId::spawn_blocking(TraceId::current)
            .await
            .expect("blocking task joins");
        assert_eq!(seen, None);
    }

    #[test]
    fn parses_hyphenated_uuids_only() {
        let id = TraceId::generate();
        assert_eq!(id.to_string().parse::<TraceId>().ok(), Some(id));
        assert!("not-a-uuid".parse::<TraceId>().is_err());
    }
}
