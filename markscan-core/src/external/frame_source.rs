// ============================================================================
// markscan-core/src/external/frame_source.rs
// ============================================================================
//
// FRAME SOURCES: sequential RGB frames from a video
//
// The scanners only need "give me the next frame". SidecarFrameSource
// decodes through an ffmpeg child writing rgb24 rawvideo to stdout;
// IterFrameSource adapts any in-memory iterator (synthetic videos, tests).

use super::ffprobe_executor::probe_video;
use crate::calibration::Resolution;
use crate::error::{CoreError, CoreResult, source_unreadable};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use image::RgbImage;
use std::path::Path;

/// A forward-only sequence of decoded frames. Frame indices are implied by
/// call order, starting at 0.
pub trait FrameSource {
    /// Dimensions of every frame produced.
    fn resolution(&self) -> Resolution;

    /// Frame count if known in advance (used for progress only).
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }

    /// The next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> CoreResult<Option<RgbImage>>;
}

/// Decodes a video file with ffmpeg.
pub struct SidecarFrameSource {
    resolution: Resolution,
    fps: Option<f64>,
    total_frames: Option<u64>,
    child: FfmpegChild,
    events: FfmpegIterator,
    finished: bool,
}

impl SidecarFrameSource {
    /// Probes and starts decoding `path`. Any failure is `SourceUnreadable`.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(source_unreadable(path, "file does not exist"));
        }
        let metadata = probe_video(path).map_err(|e| source_unreadable(path, e))?;

        let mut child = FfmpegCommand::new()
            .input(path.to_string_lossy().as_ref())
            .rawvideo()
            .spawn()
            .map_err(|e| source_unreadable(path, e))?;
        let events = child.iter().map_err(|e| source_unreadable(path, e))?;

        log::debug!(
            "Decoding {} at {} ({} frames reported)",
            path.display(),
            metadata.resolution,
            metadata
                .total_frames
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        Ok(Self {
            resolution: metadata.resolution,
            fps: metadata.fps,
            total_frames: metadata.total_frames,
            child,
            events,
            finished: false,
        })
    }

    /// Frame rate reported by ffprobe, if usable.
    pub fn fps(&self) -> Option<f64> {
        self.fps
    }
}

impl FrameSource for SidecarFrameSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.total_frames
    }

    fn next_frame(&mut self) -> CoreResult<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }
        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let (width, height) = (frame.width, frame.height);
                    let image = RgbImage::from_raw(width, height, frame.data).ok_or_else(|| {
                        CoreError::OperationFailed(format!(
                            "decoded frame buffer does not match {width}x{height}"
                        ))
                    })?;
                    return Ok(Some(image));
                }
                FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => {
                    log::warn!("ffmpeg decode: {msg}");
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| CoreError::CommandWait("ffmpeg (decode)".to_string(), e))?;
        if !status.success() {
            log::warn!("ffmpeg decoder exited with {status}");
        }
        Ok(None)
    }
}

impl Drop for SidecarFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            // Stopped early; don't leave the decoder running.
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Wraps an iterator of frames as a [`FrameSource`].
pub struct IterFrameSource<I> {
    resolution: Resolution,
    frames: I,
}

impl<I: Iterator<Item = RgbImage>> IterFrameSource<I> {
    pub fn new(resolution: Resolution, frames: I) -> Self {
        Self { resolution, frames }
    }
}

impl<I: Iterator<Item = RgbImage>> FrameSource for IterFrameSource<I> {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self) -> CoreResult<Option<RgbImage>> {
        match self.frames.next() {
            Some(frame) if frame.dimensions() != (self.resolution.width, self.resolution.height) => {
                Err(CoreError::OperationFailed(format!(
                    "frame is {}x{}, expected {}",
                    frame.width(),
                    frame.height(),
                    self.resolution
                )))
            }
            other => Ok(other),
        }
    }
}
