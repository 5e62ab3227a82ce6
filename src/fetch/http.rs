use super::Downloader;
use crate::core::error::{Error, Result};
use std::io::Write;
use std::time::Duration;

/// Blocking HTTP(S) downloader.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Create a downloader with the given overall request timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout(timeout)
            .build();
        Self { agent }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => Error::download(url, format!("HTTP status {}", code)),
            other => Error::download(url, other),
        })?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(Error::download(url, format!("HTTP status {}", status)));
        }

        let mut reader = response.into_reader();
        std::io::copy(&mut reader, out)
            .map_err(|e| Error::download(url, format!("transfer interrupted: {}", e)))
    }
}
