use super::{CatalogError, CatalogPage, CatalogResult};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

pub const AUTH_ERROR_MESSAGE: &str = "The catalog refused our credentials, probably because the \
access token expired. Go back and retry; if that keeps failing, restart and log in again.";

/// A background catalog fetch. The task sends its page exactly once; the
/// menu that owns the loader polls it with short timeouts from the UI loop.
pub struct Loader {
    label: String,
    receiver: Option<oneshot::Receiver<CatalogPage>>,
    results: Option<CatalogPage>,
}

impl Loader {
    /// Spawn `fetch` on the current tokio runtime.
    pub fn spawn(label: impl Into<String>, fetch: BoxFuture<'static, CatalogResult>) -> Self {
        let label = label.into();
        let (sender, receiver) = oneshot::channel();
        let task_label = label.clone();

        tokio::spawn(async move {
            debug!("Loader '{}' started", task_label);
            let page = recover(&task_label, fetch.await);
            // The menu may be gone by now, nobody left to tell
            let _ = sender.send(page);
        });

        Self {
            label,
            receiver: Some(receiver),
            results: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.results.is_some()
    }

    /// Wait at most `timeout` for the completion signal. Returns `true` once
    /// results are available; never polls the channel again after that.
    pub async fn poll(&mut self, timeout: Duration) -> bool {
        if self.results.is_some() {
            return true;
        }
        let Some(receiver) = self.receiver.as_mut() else {
            return false;
        };

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(page)) => {
                debug!("Loader '{}' delivered {} items", self.label, page.items.len());
                self.results = Some(page);
            }
            Ok(Err(_)) => {
                error!("Loader '{}' died before delivering results", self.label);
                self.results = Some(CatalogPage::default());
            }
            Err(_) => return false,
        }
        self.receiver = None;
        true
    }

    pub fn results(&self) -> Option<&CatalogPage> {
        self.results.as_ref()
    }
}

/// Service failures end up as an empty page, never as an error for the UI.
pub fn recover(label: &str, result: CatalogResult) -> CatalogPage {
    match result {
        Ok(page) => page,
        Err(CatalogError::Unauthorized) => {
            warn!("Loader '{}': catalog credentials rejected", label);
            CatalogPage::empty_with_message(AUTH_ERROR_MESSAGE)
        }
        Err(e) => {
            error!("Loader '{}' failed: {}", label, e);
            CatalogPage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::track;
    use crate::catalog::CatalogItem;
    use futures::FutureExt;

    #[tokio::test]
    async fn delivers_results_once_complete() {
        let page = CatalogPage::new(vec![CatalogItem::Track(track("A", "x"))]);
        let expected = page.clone();
        let mut loader = Loader::spawn("tracks", async move { Ok(page) }.boxed());

        assert!(loader.poll(Duration::from_secs(1)).await);
        assert!(loader.is_loaded());
        assert_eq!(loader.results(), Some(&expected));
        // second poll is answered from the stored page
        assert!(loader.poll(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn pending_fetch_times_out_as_not_loaded() {
        let mut loader = Loader::spawn("slow", futures::future::pending::<CatalogResult>().boxed());
        assert!(!loader.poll(Duration::from_millis(10)).await);
        assert!(!loader.is_loaded());
        assert!(loader.results().is_none());
    }

    #[tokio::test]
    async fn unauthorized_becomes_advisory() {
        let mut loader = Loader::spawn(
            "playlists",
            async { Err::<CatalogPage, _>(CatalogError::Unauthorized) }.boxed(),
        );
        assert!(loader.poll(Duration::from_secs(1)).await);
        let results = loader.results().expect("results");
        assert!(results.items.is_empty());
        assert_eq!(results.message.as_deref(), Some(AUTH_ERROR_MESSAGE));
    }

    #[test]
    fn other_failures_become_empty_pages() {
        let page = recover("search", Err(CatalogError::Unavailable("offline".into())));
        assert_eq!(page, CatalogPage::default());
    }
}
