//! Audio format conversion
//!
//! WAV is produced in-process (rodio decodes the MP3, hound writes PCM).
//! OGG Vorbis needs an encoder, so it goes through `ffmpeg`.
//! Output is written to a `.part` file and renamed only on success.

use super::{part_path, AudioFormat};
use crate::error::{NarratorError, NarratorResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Convert the MP3 at `source` into `format` at `target`
pub async fn convert(source: &Path, target: &Path, format: AudioFormat) -> NarratorResult<()> {
    info!(
        "🔄 Converting {} to {}",
        source.display(),
        format.extension()
    );
    let part = part_path(target);

    let result = match format {
        AudioFormat::Mp3 => tokio::fs::copy(source, &part)
            .await
            .map(|_| ())
            .map_err(NarratorError::from),
        AudioFormat::Wav => {
            let (src, dst) = (source.to_path_buf(), part.clone());
            tokio::task::spawn_blocking(move || mp3_to_wav(&src, &dst))
                .await
                .map_err(|e| NarratorError::Conversion(format!("task join error: {e}")))
                .and_then(|r| r)
        }
        AudioFormat::Ogg => ffmpeg_vorbis(source, &part).await,
    };

    match result {
        Ok(()) => {
            tokio::fs::rename(&part, target).await?;
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

fn conversion_error(context: &str, e: impl std::fmt::Display) -> NarratorError {
    NarratorError::Conversion(format!("{context}: {e}"))
}

fn mp3_to_wav(source: &Path, target: &Path) -> NarratorResult<()> {
    use rodio::Source;

    let file = File::open(source)?;
    let decoder = rodio::Decoder::new(BufReader::new(file))
        .map_err(|e| conversion_error("cannot decode MP3", e))?;

    let spec = hound::WavSpec {
        channels: decoder.channels(),
        sample_rate: decoder.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(target, spec).map_err(|e| conversion_error("cannot create WAV", e))?;

    let mut samples = 0usize;
    for sample in decoder {
        writer
            .write_sample(sample)
            .map_err(|e| conversion_error("cannot write WAV", e))?;
        samples += 1;
    }
    writer
        .finalize()
        .map_err(|e| conversion_error("cannot finalize WAV", e))?;

    if samples == 0 {
        return Err(NarratorError::Conversion("decoded no audio".to_string()));
    }
    debug!("Wrote {} samples to {}", samples, target.display());
    Ok(())
}

async fn ffmpeg_vorbis(source: &Path, target: &Path) -> NarratorResult<()> {
    let output = tokio::process::Command::new("ffmpeg")
        .arg("-y")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(source)
        .args(["-c:a", "libvorbis", "-f", "ogg"])
        .arg(target)
        .output()
        .await
        .map_err(|e| conversion_error("failed to spawn ffmpeg", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(NarratorError::Conversion(format!(
            "ffmpeg failed with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
