//! Song audio decoding via symphonia.
//!
//! Decoding is CPU-bound and synchronous; `AudioClock` runs it on the tokio
//! blocking pool.

use std::io::Cursor;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::LoadError;
use crate::pcm::Pcm;

fn map_symphonia(err: SymphoniaError) -> LoadError {
    match err {
        SymphoniaError::IoError(e) => LoadError::Io(e),
        SymphoniaError::Unsupported(what) => LoadError::Unsupported(what.to_string()),
        other => LoadError::Decode(other.to_string()),
    }
}

/// Decode an in-memory audio file. `ext_hint` is a file extension such as `"mp3"`.
pub fn decode_bytes(bytes: Vec<u8>, ext_hint: Option<&str>) -> Result<Pcm, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = ext_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(map_symphonia)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| LoadError::Unsupported("no audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(map_symphonia)?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels: u16 = 0;
    let mut sample_rate: u32 = track.codec_params.sample_rate.unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(map_symphonia(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frame: skip it and keep going
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("audio decode: skipping bad packet: {msg}");
                continue;
            }
            Err(e) => return Err(map_symphonia(e)),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count() as u16;
        sample_rate = spec.rate;

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let pcm = Pcm::new(samples, channels, sample_rate);
    if !pcm.validate() {
        return Err(LoadError::Empty);
    }
    debug!(
        "audio decoded: {} frames, {} ch, {} Hz ({:.0} ms)",
        pcm.num_frames(),
        pcm.channels,
        pcm.sample_rate,
        pcm.duration_ms()
    );
    Ok(pcm)
}

/// Read and decode an audio file, using its extension as the format hint.
pub fn decode_file(path: &Path) -> Result<Pcm, LoadError> {
    let bytes = std::fs::read(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    decode_bytes(bytes, ext.as_deref())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV file.
    pub(crate) fn wav_bytes(frames: usize, channels: u16, sample_rate: u32) -> Vec<u8> {
        let data_len = (frames * usize::from(channels) * 2) as u32;
        let block_align = channels * 2;
        let byte_rate = sample_rate * u32::from(block_align);

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..frames * usize::from(channels) {
            let s = ((i % 100) as i16 - 50) * 100;
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_wav() {
        let pcm = decode_bytes(wav_bytes(4410, 2, 44_100), Some("wav")).unwrap();
        assert_eq!(pcm.channels, 2);
        assert_eq!(pcm.sample_rate, 44_100);
        assert_eq!(pcm.num_frames(), 4410);
        assert!((pcm.duration_ms() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode_bytes(Vec::new(), None), Err(LoadError::Empty)));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_bytes(vec![0x42; 1024], Some("mp3")).unwrap_err();
        assert!(!matches!(err, LoadError::Empty));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/nonexistent/song.ogg")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.WAV");
        std::fs::write(&path, wav_bytes(800, 1, 8000)).unwrap();
        let pcm = decode_file(&path).unwrap();
        assert_eq!(pcm.num_frames(), 800);
    }
}
