//! Decides, per call, whether the remote store is worth trying at all.

/// Fast, infallible reachability predicate. Implementations must not cache.
pub trait Environment: Send + Sync {
    fn remote_available(&self) -> bool;
}

impl<F> Environment for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn remote_available(&self) -> bool {
        self()
    }
}

/// Reachable when an endpoint is configured and served over http(s).
///
/// A board opened from a plain file path, or with no endpoint at all, runs
/// entirely against the local store.
#[derive(Debug, Clone, Default)]
pub struct ServerEnvironment {
    endpoint: Option<String>,
}

impl ServerEnvironment {
    pub fn new(endpoint: Option<String>) -> Self {
        Self { endpoint }
    }
}

impl Environment for ServerEnvironment {
    fn remote_available(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|url| {
            let url = url.trim_start().to_ascii_lowercase();
            url.starts_with("http://") || url.starts_with("https://")
        })
    }
}
