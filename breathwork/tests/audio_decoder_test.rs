/// Integration tests for cue decoding
///
/// Builds small PCM WAV files in memory and decodes them through symphonia.

use breathwork_lib::audio::{decode_bytes, decode_file, AudioError};

/// 16-bit PCM WAV with interleaved `frames`
fn wav_bytes(sample_rate: u32, channels: u16, frames: &[Vec<i16>]) -> Vec<u8> {
    let block_align = channels * 2;
    let data_len = (frames.len() * block_align as usize) as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for frame in frames {
        for sample in frame {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
    }
    bytes
}

#[test]
fn test_decode_mono_wav() {
    let frames: Vec<Vec<i16>> = (0..8000).map(|i| vec![(i % 100) as i16 * 100]).collect();
    let clip = decode_bytes(wav_bytes(16000, 1, &frames), Some("wav")).unwrap();

    println!("Decoded {} samples @ {} Hz", clip.samples.len(), clip.sample_rate);

    assert_eq!(clip.sample_rate, 16000);
    assert_eq!(clip.samples.len(), 8000);
    assert!((clip.duration_ms() - 500.0).abs() < 1e-9);
}

#[test]
fn test_decode_stereo_wav_downmixes() {
    // Left at half scale, right silent
    let frames: Vec<Vec<i16>> = (0..4410).map(|_| vec![i16::MAX / 2, 0]).collect();
    let clip = decode_bytes(wav_bytes(44100, 2, &frames), Some("wav")).unwrap();

    assert_eq!(clip.sample_rate, 44100);
    assert_eq!(clip.samples.len(), 4410);
    for sample in &clip.samples {
        assert!((sample - 0.25).abs() < 0.01, "expected ~0.25, got {}", sample);
    }
}

#[test]
fn test_decode_missing_file() {
    let result = decode_file(std::path::Path::new("definitely/not/here/breath-in.mp3"));
    assert!(matches!(result, Err(AudioError::Io(_))));
}

#[test]
fn test_decode_from_disk() {
    let dir = std::env::temp_dir().join(format!("breathwork-decode-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cue.wav");

    let frames: Vec<Vec<i16>> = (0..2205).map(|_| vec![1000]).collect();
    std::fs::write(&path, wav_bytes(22050, 1, &frames)).unwrap();

    let clip = decode_file(&path).unwrap();
    assert_eq!(clip.samples.len(), 2205);
    assert!((clip.duration_ms() - 100.0).abs() < 1e-9);

    std::fs::remove_dir_all(&dir).unwrap();
}
