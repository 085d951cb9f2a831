//! Media loader: bounded wait for a readable frame

use crate::config::LoaderConfig;
use crate::media::MediaSource;
use crate::result::{ExportError, ExportResult};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Make sure the media can be drawn.
///
/// Resolves immediately when a frame is buffered and the duration is
/// positive. Otherwise waits for the loaded or error signal, bounded by
/// `load_timeout_ms`.
pub async fn ensure_ready(media: &mut dyn MediaSource, config: &LoaderConfig) -> ExportResult<()> {
    if media.ready_state().has_current_data() && media.duration() > 0.0 {
        return Ok(());
    }

    tracing::debug!(
        ready_state = ?media.ready_state(),
        timeout_ms = config.load_timeout_ms,
        "waiting for media data"
    );
    match tokio::time::timeout(config.load_timeout(), media.loaded()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ExportError::LoadError { message: e.message }),
        Err(_) => Err(ExportError::LoadTimeout {
            ms: config.load_timeout_ms,
        }),
    }
}

/// Draw the current media frame onto a capture surface.
///
/// The surface has the media's natural size, or the fallback square when the
/// platform reports zero dimensions.
pub fn draw_current_frame(media: &dyn MediaSource, config: &LoaderConfig) -> ExportResult<RgbaImage> {
    let (width, height) = config.surface_size(media.natural_size());
    let frame = media.current_frame().ok_or_else(|| {
        ExportError::capture_failed(1, format!("no frame at {:.3}s", media.current_time()))
    })?;
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ExportError::capture_failed(1, "media frame is empty"));
    }
    if frame.dimensions() == (width, height) {
        Ok(frame)
    } else {
        Ok(imageops::resize(&frame, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clip::{ClipMedia, LoadBehavior};
    use crate::result::FailureKind;
    use std::time::Duration;
    use tokio::time::Instant;

    fn clip() -> ClipMedia {
        ClipMedia::color_cycle(2, 2, &[[9, 9, 9, 255]], 2.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffered_media_resolves_immediately() {
        let mut media = clip();
        let start = Instant::now();
        ensure_ready(&mut media, &LoaderConfig::default()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_load_within_deadline() {
        let mut media = clip().with_load(LoadBehavior::Delayed(Duration::from_secs(1)));
        ensure_ready(&mut media, &LoaderConfig::default()).await.unwrap();
        assert!(media.ready_state().has_current_data());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_loading_times_out_after_five_seconds() {
        let mut media = clip().with_load(LoadBehavior::Never);
        let start = Instant::now();

        let err = ensure_ready(&mut media, &LoaderConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::LoadTimeout);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_error_signal_is_load_error() {
        let mut media = clip().with_load(LoadBehavior::Fail("decode error".into()));
        let err = ensure_ready(&mut media, &LoaderConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::LoadError);
        assert!(err.to_string().contains("decode error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_duration_waits_for_signal() {
        let mut media = clip()
            .with_reported_duration(f64::NAN)
            .with_load(LoadBehavior::Delayed(Duration::from_millis(10)));
        let start = Instant::now();
        ensure_ready(&mut media, &LoaderConfig::default()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(10));
    }

    mod surface_tests {
        use super::*;

        #[test]
        fn test_surface_matches_natural_size() {
            let media = ClipMedia::color_cycle(16, 9, &[[1, 2, 3, 255]], 1.0);
            let still = draw_current_frame(&media, &LoaderConfig::default()).unwrap();
            assert_eq!(still.dimensions(), (16, 9));
        }

        #[test]
        fn test_zero_natural_size_uses_fallback() {
            let media = ClipMedia::color_cycle(16, 9, &[[1, 2, 3, 255]], 1.0).with_zero_natural_size();
            let still = draw_current_frame(&media, &LoaderConfig::default()).unwrap();
            assert_eq!(still.dimensions(), (340, 340));
            assert_eq!(still.get_pixel(170, 170).0, [1, 2, 3, 255]);
        }

        #[test]
        fn test_unbuffered_media_has_no_frame() {
            let media = clip().with_load(LoadBehavior::Never);
            assert!(draw_current_frame(&media, &LoaderConfig::default()).is_err());
        }
    }
}
