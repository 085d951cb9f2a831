//! Delivery dispatcher and hosts
//!
//! The dispatcher decides how a finished artifact reaches the user; a
//! [`DeliveryHost`] performs it. Handheld platforms try the native share sheet
//! and fall back to a full-screen view with a long-press hint. Desktop
//! platforms download directly.
//!
//! # Implementations
//!
//! - `DirectoryHost` - writes downloads and fallback pages into a directory
//! - `MockHost` - records calls, scripted share outcome, for unit testing

use crate::frame::{with_extension, ExportArtifact};
use crate::platform::PlatformCapabilities;
use crate::result::{ExportError, ExportResult, FailureKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Instruction shown under the fallback view
pub const LONG_PRESS_HINT: &str = "이미지를 길게 눌러 저장하세요 (Long-press the image to save it)";

/// Result of a native share attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The share sheet completed
    Shared,
    /// The user dismissed the sheet
    Cancelled,
    /// No share capability for this file
    Unsupported,
    /// Share failed for another reason
    Rejected(String),
}

impl ShareOutcome {
    /// Failure classification, `None` for a completed share
    #[must_use]
    pub const fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Shared => None,
            Self::Cancelled => Some(FailureKind::ShareCancelled),
            Self::Unsupported => Some(FailureKind::ShareUnsupported),
            Self::Rejected(_) => Some(FailureKind::ShareRejected),
        }
    }
}

/// How an artifact was handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Native share sheet completed
    Shared,
    /// Share sheet dismissed by the user; counts as success
    ShareCancelled,
    /// Direct file download
    Downloaded,
    /// Full-screen view with a long-press hint
    FallbackView,
}

/// Host environment that can hand files to the user
#[async_trait]
pub trait DeliveryHost: Send + Sync {
    /// Whether the native share sheet accepts this file
    fn can_share(&self, artifact: &ExportArtifact) -> bool;

    /// Open the native share sheet with the artifact attached
    async fn share(&mut self, artifact: &ExportArtifact) -> ShareOutcome;

    /// Save the artifact under its filename
    async fn download(&mut self, artifact: &ExportArtifact) -> ExportResult<()>;

    /// Show the artifact full-screen with [`LONG_PRESS_HINT`]
    async fn open_fallback_view(&mut self, artifact: &ExportArtifact) -> ExportResult<()>;
}

/// Routes artifacts by platform capability
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryDispatcher {
    caps: PlatformCapabilities,
}

impl DeliveryDispatcher {
    /// Create a dispatcher for a platform
    #[must_use]
    pub const fn new(caps: PlatformCapabilities) -> Self {
        Self { caps }
    }

    /// Deliver the artifact. A cancelled share is success; unsupported or
    /// rejected shares fall back to the full-screen view.
    pub async fn deliver<H>(&self, host: &mut H, artifact: &ExportArtifact) -> ExportResult<DeliveryMethod>
    where
        H: DeliveryHost + ?Sized,
    {
        if !self.caps.is_handheld() {
            host.download(artifact).await?;
            tracing::info!(filename = %artifact.filename, "artifact downloaded");
            return Ok(DeliveryMethod::Downloaded);
        }

        let outcome = if self.caps.supports_native_share && host.can_share(artifact) {
            host.share(artifact).await
        } else {
            ShareOutcome::Unsupported
        };
        match outcome {
            ShareOutcome::Shared => {
                tracing::info!(filename = %artifact.filename, "artifact shared");
                return Ok(DeliveryMethod::Shared);
            }
            ShareOutcome::Cancelled => {
                tracing::info!("share cancelled by user");
                return Ok(DeliveryMethod::ShareCancelled);
            }
            ShareOutcome::Unsupported => tracing::debug!("native share unavailable, using fallback view"),
            ShareOutcome::Rejected(reason) => {
                tracing::warn!("share failed, using fallback view: {reason}");
            }
        }

        host.open_fallback_view(artifact).await?;
        Ok(DeliveryMethod::FallbackView)
    }
}

/// Delivers into a directory: downloads are files, the fallback view is an
/// HTML page embedding the artifact
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectoryHost {
    /// Deliver into `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Every file written so far
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn target_path(&self, filename: &str) -> ExportResult<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ExportError::delivery(format!("invalid filename {filename:?}")))?;
        Ok(self.dir.join(name))
    }

    async fn write(&mut self, filename: &str, data: &[u8]) -> ExportResult<PathBuf> {
        let path = self.target_path(filename)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, data).await?;
        self.written.push(path.clone());
        Ok(path)
    }
}

/// Full-screen page showing the artifact with the long-press hint
#[must_use]
pub fn fallback_page(artifact: &ExportArtifact) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n</head>\n\
         <body style=\"margin:0;background:#000;display:flex;flex-direction:column;align-items:center;justify-content:center;min-height:100vh\">\n\
         <img src=\"{uri}\" alt=\"{title}\" style=\"max-width:100%\">\n\
         <p style=\"color:#fff;font-family:sans-serif\">{hint}</p>\n</body>\n</html>\n",
        title = escape_html(&artifact.filename),
        uri = artifact.to_data_uri(),
        hint = LONG_PRESS_HINT,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
impl DeliveryHost for DirectoryHost {
    fn can_share(&self, _artifact: &ExportArtifact) -> bool {
        false
    }

    async fn share(&mut self, _artifact: &ExportArtifact) -> ShareOutcome {
        ShareOutcome::Unsupported
    }

    async fn download(&mut self, artifact: &ExportArtifact) -> ExportResult<()> {
        self.write(&artifact.filename, &artifact.data).await?;
        Ok(())
    }

    async fn open_fallback_view(&mut self, artifact: &ExportArtifact) -> ExportResult<()> {
        let page = fallback_page(artifact);
        let name = with_extension(&artifact.filename, "html");
        self.write(&name, page.as_bytes()).await?;
        Ok(())
    }
}

/// Mock host for unit testing
#[derive(Debug)]
pub struct MockHost {
    /// Outcome returned by `share`
    pub share_outcome: ShareOutcome,
    /// Whether `can_share` accepts files
    pub accepts_files: bool,
    /// Artifacts handed over by any method
    pub delivered: Vec<ExportArtifact>,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            share_outcome: ShareOutcome::Shared,
            accepts_files: true,
            delivered: Vec::new(),
            call_history: Vec::new(),
        }
    }
}

impl MockHost {
    /// Create a host whose shares succeed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the share outcome
    #[must_use]
    pub fn with_share_outcome(mut self, outcome: ShareOutcome) -> Self {
        self.share_outcome = outcome;
        self
    }

    /// Report that files cannot be shared
    #[must_use]
    pub fn refusing_files(mut self) -> Self {
        self.accepts_files = false;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }
}

#[async_trait]
impl DeliveryHost for MockHost {
    fn can_share(&self, _artifact: &ExportArtifact) -> bool {
        self.accepts_files
    }

    async fn share(&mut self, artifact: &ExportArtifact) -> ShareOutcome {
        self.call_history.push(format!("share:{}", artifact.filename));
        self.delivered.push(artifact.clone());
        self.share_outcome.clone()
    }

    async fn download(&mut self, artifact: &ExportArtifact) -> ExportResult<()> {
        self.call_history.push(format!("download:{}", artifact.filename));
        self.delivered.push(artifact.clone());
        Ok(())
    }

    async fn open_fallback_view(&mut self, artifact: &ExportArtifact) -> ExportResult<()> {
        self.call_history.push(format!("fallback:{}", artifact.filename));
        self.delivered.push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn artifact(name: &str) -> ExportArtifact {
        ExportArtifact::still(Frame::new(vec![1, 2, 3], 1, 1), name)
    }

    mod dispatch_tests {
        use super::*;

        #[tokio::test]
        async fn test_desktop_downloads() {
            let mut host = MockHost::new();
            let method = DeliveryDispatcher::new(PlatformCapabilities::desktop())
                .deliver(&mut host, &artifact("card.png"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::Downloaded);
            assert_eq!(host.history(), &["download:card.png".to_string()]);
        }

        #[tokio::test]
        async fn test_handheld_shares() {
            let mut host = MockHost::new();
            let method = DeliveryDispatcher::new(PlatformCapabilities::iphone())
                .deliver(&mut host, &artifact("card.gif"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::Shared);
            assert!(!host.was_called("download"));
        }

        #[tokio::test]
        async fn test_cancel_is_success_without_fallback() {
            let mut host = MockHost::new().with_share_outcome(ShareOutcome::Cancelled);
            let method = DeliveryDispatcher::new(PlatformCapabilities::android())
                .deliver(&mut host, &artifact("card.gif"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::ShareCancelled);
            assert!(!host.was_called("fallback"));
        }

        #[tokio::test]
        async fn test_rejected_share_falls_back() {
            let mut host =
                MockHost::new().with_share_outcome(ShareOutcome::Rejected("NotAllowedError".into()));
            let method = DeliveryDispatcher::new(PlatformCapabilities::iphone())
                .deliver(&mut host, &artifact("card.gif"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::FallbackView);
            assert_eq!(
                host.history(),
                &["share:card.gif".to_string(), "fallback:card.gif".to_string()]
            );
        }

        #[tokio::test]
        async fn test_unshareable_file_skips_share() {
            let mut host = MockHost::new().refusing_files();
            let method = DeliveryDispatcher::new(PlatformCapabilities::iphone())
                .deliver(&mut host, &artifact("card.gif"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::FallbackView);
            assert!(!host.was_called("share"));
        }

        #[tokio::test]
        async fn test_handheld_without_share_api() {
            let mut host = MockHost::new();
            let caps = PlatformCapabilities::iphone().with_native_share(false);
            let method = DeliveryDispatcher::new(caps)
                .deliver(&mut host, &artifact("card.png"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::FallbackView);
        }

        #[test]
        fn test_outcome_kinds() {
            assert_eq!(ShareOutcome::Shared.kind(), None);
            assert_eq!(
                ShareOutcome::Cancelled.kind(),
                Some(FailureKind::ShareCancelled)
            );
            assert_eq!(
                ShareOutcome::Rejected(String::new()).kind(),
                Some(FailureKind::ShareRejected)
            );
        }
    }

    mod directory_tests {
        use super::*;

        #[tokio::test]
        async fn test_download_writes_file() {
            let dir = tempfile::tempdir().unwrap();
            let mut host = DirectoryHost::new(dir.path());
            host.download(&artifact("card.png")).await.unwrap();
            assert_eq!(std::fs::read(dir.path().join("card.png")).unwrap(), vec![1, 2, 3]);
            assert_eq!(host.written().len(), 1);
        }

        #[tokio::test]
        async fn test_download_strips_directories() {
            let dir = tempfile::tempdir().unwrap();
            let mut host = DirectoryHost::new(dir.path());
            host.download(&artifact("../escape.png")).await.unwrap();
            assert!(dir.path().join("escape.png").exists());
        }

        #[tokio::test]
        async fn test_fallback_page_embeds_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let mut host = DirectoryHost::new(dir.path());
            host.open_fallback_view(&artifact("card.gif")).await.unwrap();
            let page = std::fs::read_to_string(dir.path().join("card.html")).unwrap();
            assert!(page.contains("data:image/png;base64,AQID"));
            assert!(page.contains(LONG_PRESS_HINT));
        }

        #[tokio::test]
        async fn test_handheld_directory_host_uses_fallback() {
            let dir = tempfile::tempdir().unwrap();
            let mut host = DirectoryHost::new(dir.path());
            let method = DeliveryDispatcher::new(PlatformCapabilities::iphone())
                .deliver(&mut host, &artifact("card.png"))
                .await
                .unwrap();
            assert_eq!(method, DeliveryMethod::FallbackView);
            assert!(dir.path().join("card.html").exists());
        }

        #[test]
        fn test_escape_html() {
            assert_eq!(escape_html("<a&\"b\">"), "&lt;a&amp;&quot;b&quot;&gt;");
        }
    }
}
