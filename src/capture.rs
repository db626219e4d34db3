//! Recording the composited canvas to a file.
//!
//! Encoder selection is a ranked first-match probe over four candidates;
//! the winner fixes both the container and the output file extension. The
//! session itself pipes raw RGBA frames into a system `ffmpeg` child, with
//! the microphone muxed in as a second input when one is configured. We use
//! the system binary rather than `ffmpeg-next` to avoid native FFmpeg dev
//! header/lib requirements.

use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::{Bitmap, CANVAS_HEIGHT, CANVAS_WIDTH},
    error::{StudioError, StudioResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Webm,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }
}

/// One encoder configuration to probe. `video`/`audio` name ffmpeg encoders;
/// `None` means the container's default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderCandidate {
    pub container: Container,
    pub video: Option<&'static str>,
    pub audio: Option<&'static str>,
}

impl EncoderCandidate {
    fn video_codec(&self) -> &'static str {
        self.video.unwrap_or(match self.container {
            Container::Mp4 => "libx264",
            Container::Webm => "libvpx-vp9",
        })
    }

    fn audio_codec(&self) -> &'static str {
        self.audio.unwrap_or(match self.container {
            Container::Mp4 => "aac",
            Container::Webm => "libopus",
        })
    }
}

/// Probe order. The first candidate supported by the local ffmpeg wins.
pub const ENCODER_CANDIDATES: [EncoderCandidate; 4] = [
    EncoderCandidate {
        container: Container::Mp4,
        video: Some("libx264"),
        audio: Some("aac"),
    },
    EncoderCandidate {
        container: Container::Mp4,
        video: None,
        audio: None,
    },
    EncoderCandidate {
        container: Container::Webm,
        video: Some("libvpx-vp9"),
        audio: None,
    },
    EncoderCandidate {
        container: Container::Webm,
        video: None,
        audio: None,
    },
];

/// The set of encoder names the local ffmpeg build offers.
#[derive(Clone, Debug, Default)]
pub struct EncoderSupport {
    names: std::collections::HashSet<String>,
}

impl EncoderSupport {
    pub fn from_names<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Query `ffmpeg -encoders` once. A missing ffmpeg yields an empty set,
    /// which makes every candidate unsupported.
    pub fn probe() -> Self {
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                Self::parse_encoder_list(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                tracing::warn!("ffmpeg -encoders exited with status {}", out.status);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("ffmpeg not available: {e}");
                Self::default()
            }
        }
    }

    /// ffmpeg lists encoders as ` V..... libx264   H.264 / ...` after a
    /// `------` separator line.
    fn parse_encoder_list(stdout: &str) -> Self {
        let names = stdout
            .lines()
            .skip_while(|line| !line.trim_start().starts_with("------"))
            .skip(1)
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// The effective video codec must be present; audio is only required
    /// when the candidate names one explicitly.
    pub fn supports(&self, candidate: &EncoderCandidate) -> bool {
        self.names.contains(candidate.video_codec())
            && candidate.audio.is_none_or(|a| self.names.contains(a))
    }
}

/// Ranked first-match over [`ENCODER_CANDIDATES`].
pub fn select_encoder(support: &EncoderSupport) -> StudioResult<EncoderCandidate> {
    ENCODER_CANDIDATES
        .iter()
        .copied()
        .find(|c| support.supports(c))
        .ok_or_else(|| {
            StudioError::capture("no supported encoding among the candidate container/codec pairs")
        })
}

pub fn recording_file_name(candidate: &EncoderCandidate, now: chrono::DateTime<chrono::Utc>) -> String {
    // Colons are not portable in file names, so use the basic ISO 8601
    // form, e.g. 20260830T123456.
    format!(
        "studio_recording_{}.{}",
        now.format("%Y%m%dT%H%M%S"),
        candidate.container.extension()
    )
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub fps: u32,
    pub out_dir: PathBuf,
    /// ffmpeg audio input for the microphone, e.g. `("pulse", "default")`.
    /// `None` records video only.
    pub audio_input: Option<(String, String)>,
}

impl CaptureConfig {
    pub fn validate(&self) -> StudioResult<()> {
        if self.fps == 0 {
            return Err(StudioError::validation("capture fps must be non-zero"));
        }
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> StudioResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// One recording take. Frames are flattened to opaque RGBA and streamed to
/// ffmpeg; `finish` waits for the child and moves the temp output to its
/// timestamped final name.
pub struct CaptureSession {
    candidate: EncoderCandidate,
    fps: u32,
    temp_path: PathBuf,
    final_path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
    frames_written: u64,
}

impl CaptureSession {
    pub fn start(cfg: &CaptureConfig, support: &EncoderSupport) -> StudioResult<Self> {
        cfg.validate()?;
        let candidate = select_encoder(support)?;

        let final_path = cfg.out_dir.join(recording_file_name(&candidate, chrono::Utc::now()));
        let temp_path = final_path.with_extension(format!(
            "{}.part",
            candidate.container.extension()
        ));
        ensure_parent_dir(&final_path)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{CANVAS_WIDTH}x{CANVAS_HEIGHT}"),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        if let Some((format, device)) = &cfg.audio_input {
            cmd.args(["-f", format, "-i", device]);
            cmd.args(["-c:a", candidate.audio_codec()]);
        } else {
            cmd.arg("-an");
        }

        cmd.args(["-c:v", candidate.video_codec()]);
        if candidate.container == Container::Mp4 {
            cmd.args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"]);
        }
        cmd.arg(&temp_path);

        tracing::info!(
            container = candidate.container.extension(),
            video = candidate.video_codec(),
            "starting capture to {}",
            final_path.display()
        );

        let mut child = cmd.spawn().map_err(|e| {
            StudioError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StudioError::capture("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            candidate,
            fps: cfg.fps,
            temp_path,
            final_path,
            child,
            stdin: Some(stdin),
            scratch: vec![0u8; CANVAS_WIDTH as usize * CANVAS_HEIGHT as usize * 4],
            frames_written: 0,
        })
    }

    pub fn candidate(&self) -> EncoderCandidate {
        self.candidate
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Stream one composited frame. The frame must be full-canvas and
    /// premultiplied, as produced by the compositor.
    pub fn push_frame(&mut self, frame: &Bitmap) -> StudioResult<()> {
        if frame.width != CANVAS_WIDTH || frame.height != CANVAS_HEIGHT {
            return Err(StudioError::validation(format!(
                "frame size mismatch: got {}x{}, expected {CANVAS_WIDTH}x{CANVAS_HEIGHT}",
                frame.width, frame.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(StudioError::validation(
                "frame data size mismatch with width*height*4",
            ));
        }

        flatten_premul_to_opaque(&mut self.scratch, &frame.data);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StudioError::capture("capture session is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            StudioError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    /// Discard the take: kill the encoder, reap it and remove the partial
    /// output. For error paths where nothing can be published.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.temp_path);
    }

    /// Close the pipe, wait for ffmpeg and publish the timestamped file.
    /// Returns the final path.
    pub fn finish(mut self) -> StudioResult<PathBuf> {
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| StudioError::capture(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = std::fs::remove_file(&self.temp_path);
            return Err(StudioError::capture(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        std::fs::rename(&self.temp_path, &self.final_path).map_err(|e| {
            StudioError::capture(format!(
                "failed to move recording to '{}': {e}",
                self.final_path.display()
            ))
        })?;

        tracing::info!(
            frames = self.frames_written,
            "capture finished: {}",
            self.final_path.display()
        );
        Ok(self.final_path)
    }
}

/// Opaque output for the encoder: premultiplied pixels composite over black.
fn flatten_premul_to_opaque(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
}
