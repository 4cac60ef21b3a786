//! Correlation id stamped on every request handled by either service.
//!
//! The trace middleware opens a scope per request; anything awaited inside
//! it, including `Error` construction, can read the id back with
//! [`TraceId::current`]. Work handed to `tokio::spawn` starts outside the
//! scope and has to re-enter it explicitly.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Random v4 UUID identifying one inbound request.
///
/// Rendered in hyphenated form in the `trace-id` response header, in log
/// spans and in the `traceId` field of error bodies.
///
/// ```
/// use courier::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id: TraceId = "3f2c1e0a-9b8d-4c7e-a6f5-1d2e3c4b5a69".parse().expect("uuid");
/// let inside = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(inside, Some(id));
/// assert_eq!(TraceId::current(), None);
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id of the enclosing request, or `None` outside any scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Await `fut` with `trace_id` visible to [`TraceId::current`].
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
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
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn nested_awaits_see_the_enclosing_id() {
        let request = TraceId::generate();
        let seen = TraceId::scope(request, async {
            let deeper = async { TraceId::current() };
            deeper.await
        })
        .await;
        assert_eq!(seen, Some(request));
    }

    #[rstest]
    #[tokio::test]
    async fn inner_scope_shadows_outer_then_restores() {
        let outer = TraceId::generate();
        let inner = TraceId::generate();
        let (during, after) = TraceId::scope(outer, async move {
            let during = TraceId::scope(inner, async { TraceId::current() }).await;
            (during, TraceId::current())
        })
        .await;
        assert_eq!(during, Some(inner));
        assert_eq!(after, Some(outer));
    }

    #[rstest]
    #[tokio::test]
    async fn spawned_work_starts_without_an_id() {
        let seen = TraceId::scope(TraceId::generate(), async {
            tokio::spawn(async { TraceId::current() })
                .await
                .expect("task joins")
        })
        .await;
        assert!(seen.is_none());
    }

    #[rstest]
    fn generated_ids_are_distinct_v4_uuids() {
        let first = TraceId::generate();
        let second = TraceId::generate();
        assert_ne!(first, second);
        assert_eq!(first.0.get_version_num(), 4);
    }

    #[rstest]
    #[case("6F9619FF-8B86-D011-B42D-00CF4FC964FF", Some("6f9619ff-8b86-d011-b42d-00cf4fc964ff"))]
    #[case("6f9619ff8b86d011b42d00cf4fc964ff", Some("6f9619ff-8b86-d011-b42d-00cf4fc964ff"))]
    #[case("not-a-uuid", None)]
    fn header_text_parses_to_canonical_form(#[case] raw: &str, #[case] expected: Option<&str>) {
        let parsed = raw.parse::<TraceId>().ok().map(|id| id.to_string());
        assert_eq!(parsed.as_deref(), expected);
    }
}
