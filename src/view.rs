//! Page lifecycle shared by every view-model.

use serde::Serialize;
use tracing::error;

use crate::error::RemoteError;

/// `Loading` until the page's fetch completes, then `Ready` for good.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PageState<T> {
    Loading,
    Ready { data: T, degraded: bool },
}

impl<T> PageState<T> {
    /// Moves a loading page to ready. A page that is already ready keeps its view.
    pub fn resolve(self, data: T, degraded: bool) -> Self {
        match self {
            PageState::Loading => PageState::Ready { data, degraded },
            ready => ready,
        }
    }

    /// Derives the rendered view from the fetched rows, keeping the state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PageState<U> {
        match self {
            PageState::Loading => PageState::Loading,
            PageState::Ready { data, degraded } => PageState::Ready {
                data: f(data),
                degraded,
            },
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            PageState::Loading => None,
            PageState::Ready { data, .. } => Some(data),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PageState::Ready { degraded: true, .. })
    }
}

impl<T: Default> PageState<T> {
    /// Settles on a fetch result; a failed fetch renders as the empty view.
    pub fn settle(self, page: &'static str, result: Result<T, RemoteError>) -> Self {
        let (data, degraded) = recover(page, result);
        self.resolve(data, degraded)
    }
}

/// Logs a failed fetch and falls back to the empty value. The flag reports
/// whether the fallback was used.
pub fn recover<T: Default>(page: &'static str, result: Result<T, RemoteError>) -> (T, bool) {
    match result {
        Ok(v) => (v, false),
        Err(e) => {
            error!(page, error = %e, "fetch failed; rendering without data");
            (T::default(), true)
        }
    }
}
