use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
}

/// Raw RGBA frames on stdin, muxed with the source audio.
pub fn build_args(settings: &EncoderSettings, input_audio: &Path, output_path: &Path) -> Result<Vec<String>> {
    let input = input_audio
        .to_str()
        .with_context(|| format!("Input path is not valid UTF-8: {}", input_audio.display()))?;
    let output = output_path
        .to_str()
        .with_context(|| format!("Output path is not valid UTF-8: {}", output_path.display()))?;

    let mut args = vec![
        "-y".to_string(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", settings.width, settings.height),
        "-framerate".into(), settings.fps.to_string(),
        "-i".into(), "pipe:0".into(),
        "-i".into(), input.to_string(),
        "-c:v".into(), settings.codec.clone(),
        "-pix_fmt".into(), settings.pix_fmt.clone(),
    ];

    if let Some(ref br) = settings.bitrate {
        args.extend(["-b:v".to_string(), br.clone()]);
    } else {
        args.extend(["-crf".to_string(), settings.crf.to_string()]);
        args.extend(["-preset".to_string(), "medium".to_string()]);
    }

    args.extend([
        "-c:a".into(), "aac".into(),
        "-b:a".into(), "192k".into(),
        "-shortest".into(),
        output.to_string(),
    ]);
    Ok(args)
}

pub struct FfmpegEncoder {
    child: Child,
    frame_len: usize,
}

impl FfmpegEncoder {
    pub fn new(settings: &EncoderSettings, input_audio: &Path, output_path: &Path) -> Result<Self> {
        let args = build_args(settings, input_audio, output_path)?;

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width,
            settings.height,
            settings.fps,
            settings.codec
        );

        Ok(Self {
            child,
            frame_len: settings.width as usize * settings.height as usize * 4,
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_len {
            anyhow::bail!(
                "Frame is {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_len
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncoderSettings {
        EncoderSettings {
            width: 720,
            height: 405,
            fps: 60,
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 18,
            bitrate: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn crf_mode_args() {
        let args = build_args(&settings(), Path::new("in.wav"), Path::new("out.mp4")).unwrap();
        assert_eq!(value_after(&args, "-video_size"), Some("720x405"));
        assert_eq!(value_after(&args, "-framerate"), Some("60"));
        assert_eq!(value_after(&args, "-crf"), Some("18"));
        assert!(!args.iter().any(|a| a == "-b:v"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.iter().any(|a| a == "in.wav"));
    }

    #[test]
    fn bitrate_replaces_crf() {
        let mut s = settings();
        s.bitrate = Some("5M".into());
        let args = build_args(&s, Path::new("in.wav"), Path::new("out.mp4")).unwrap();
        assert_eq!(value_after(&args, "-b:v"), Some("5M"));
        assert!(!args.iter().any(|a| a == "-crf"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_errors() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let bad = Path::new(OsStr::from_bytes(b"in\xff.wav"));
        assert!(build_args(&settings(), bad, Path::new("out.mp4")).is_err());
    }
}
