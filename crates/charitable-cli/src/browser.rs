use tokio::io::{AsyncBufReadExt, BufReader};

use charitable_checkout::{BrowserOutcome, ExternalBrowser};

/// Stands in for the OS browser: prints the checkout URL and waits for the
/// operator to say how it went. End of input counts as closing the browser.
pub struct TerminalBrowser;

fn parse_reply(line: &str) -> Option<BrowserOutcome> {
    match line.trim().to_ascii_lowercase().as_str() {
        "done" | "completed" | "success" => Some(BrowserOutcome::Completed),
        "cancel" | "cancelled" => Some(BrowserOutcome::Cancelled),
        "close" | "dismiss" => Some(BrowserOutcome::Dismissed),
        _ => None,
    }
}

impl ExternalBrowser for TerminalBrowser {
    async fn open(&self, url: &str) -> Result<BrowserOutcome, String> {
        println!("Open this URL to finish the donation:\n\n  {url}\n");
        println!("Type `done` after paying, `cancel` to back out (Ctrl-D closes).");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_reply(&line) {
                    Some(outcome) => return Ok(outcome),
                    None => println!("Unrecognized reply {:?}; type `done` or `cancel`.", line.trim()),
                },
                Ok(None) => return Ok(BrowserOutcome::Dismissed),
                Err(e) => return Err(format!("stdin: {e}")),
            }
        }
    }
}
