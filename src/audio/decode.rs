use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded mono signal.
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// First decodable track of a container, read packet by packet.
struct TrackReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: usize,
    sample_rate: u32,
    scratch: Option<SampleBuffer<f32>>,
}

impl TrackReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }
        let format = symphonia::default::get_probe()
            .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
            .with_context(|| format!("Unrecognised audio format: {}", path.display()))?
            .format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("No audio tracks found")?;
        let track_id = track.id;
        let params = track.codec_params.clone();
        let sample_rate = params.sample_rate.context("Unknown sample rate")?;
        let channels = params.channels.map_or(1, |c| c.count()).max(1);

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        Ok(Self {
            track_id,
            format,
            decoder,
            channels,
            sample_rate,
            scratch: None,
        })
    }

    /// Appends the next packet's audio to `out` as mono. `Ok(false)` at end
    /// of stream.
    fn read_into(&mut self, out: &mut Vec<f32>) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    log::debug!("Track list changed, stopping decode");
                    return Ok(false);
                }
                Err(e) => return Err(e).context("Failed to read audio packet"),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::debug!("Skipping corrupt packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e).context("Failed to decode audio packet"),
            };

            let frames = decoded.capacity() as u64;
            let spec = *decoded.spec();
            let needed = frames as usize * spec.channels.count();
            if self.scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                self.scratch = Some(SampleBuffer::new(frames, spec));
            }
            let scratch = self.scratch.get_or_insert_with(|| SampleBuffer::new(frames, spec));
            scratch.copy_interleaved_ref(decoded);
            downmix_into(scratch.samples(), spec.channels.count(), out);
            return Ok(true);
        }
    }
}

pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let mut reader = TrackReader::open(path)?;
    let mut samples = Vec::new();
    while reader.read_into(&mut samples)? {}

    let audio = AudioData {
        samples,
        sample_rate: reader.sample_rate,
    };
    log::info!(
        "Decoded audio: {} samples, {}Hz, {} channel(s) -> mono, {:.1}s",
        audio.samples.len(),
        audio.sample_rate,
        reader.channels,
        audio.duration()
    );
    Ok(audio)
}

/// Average interleaved frames down to one channel.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let scale = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}
