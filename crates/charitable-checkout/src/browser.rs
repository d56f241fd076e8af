use std::future::Future;

/// What the external context reported when control came back to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserOutcome {
    /// The hosted page redirected to the success URL.
    Completed,
    /// The hosted page redirected to the cancel URL.
    Cancelled,
    /// The user closed the browser without either redirect.
    Dismissed,
}

/// An OS-level browser or web view the client does not control.
///
/// `open` resolves only when the external context hands control back. There
/// is no deadline and no way to abort it from this side.
pub trait ExternalBrowser: Send + Sync {
    fn open(&self, url: &str) -> impl Future<Output = Result<BrowserOutcome, String>> + Send;
}
