//! Decoding of in-memory audio files into device-ready sample buffers.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio_engine::channels::{deinterleave, interleave, map_channels};
use crate::audio_engine::errors::SampleLoadError;
use crate::messages::SampleBuffer;

/// Frames handed to the resampler per call.
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Decodes `bytes` into a sample buffer at the output rate and channel count.
///
/// `name` only provides the container hint (its extension); the format is
/// probed from the data.
///
/// # Errors
///
/// - Format not recognized or corrupted (MIDI is not decodable here)
/// - Missing track, rate or channel information
/// - Channel layouts other than mono/stereo
pub fn decode_to_sample_buffer(
    name: &str,
    bytes: Vec<u8>,
    output_channels: usize,
    output_rate_hz: u32,
) -> Result<SampleBuffer, SampleLoadError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let file_channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut decoded: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(SymphoniaError::DecodeError(err)) => {
                log::debug!("Skipping corrupt packet in {name:?}: {err}");
                continue;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };
        let spec = *audio_buf.spec();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());
    }

    let resampled = resample(decoded, file_channels, file_rate_hz, output_rate_hz)?;
    let mapped = map_channels(resampled, file_channels, output_channels)?;

    Ok(SampleBuffer {
        channels: output_channels,
        samples: Arc::from(mapped.into_boxed_slice()),
    })
}

/// Converts interleaved audio from `from_hz` to `to_hz`.
pub fn resample(
    samples: Vec<f32>,
    channels: usize,
    from_hz: u32,
    to_hz: u32,
) -> Result<Vec<f32>, SampleLoadError> {
    if from_hz == to_hz || samples.is_empty() || channels == 0 {
        return Ok(samples);
    }

    let ratio = f64::from(to_hz) / f64::from(from_hz);
    let planar = deinterleave(&samples, channels);
    let frames = planar[0].len();
    let expected_frames = (frames as f64 * ratio).round() as usize;

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        RESAMPLE_CHUNK_FRAMES,
        channels,
    )?;
    let delay = resampler.output_delay();

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected_frames + delay); channels];
    let mut append = |block: Vec<Vec<f32>>| {
        for (channel, rendered) in output.iter_mut().zip(block) {
            channel.extend(rendered);
        }
    };

    let mut pos = 0;
    while pos + RESAMPLE_CHUNK_FRAMES <= frames {
        let block: Vec<&[f32]> = planar
            .iter()
            .map(|channel| &channel[pos..pos + RESAMPLE_CHUNK_FRAMES])
            .collect();
        append(resampler.process(&block, None)?);
        pos += RESAMPLE_CHUNK_FRAMES;
    }

    if pos < frames {
        let block: Vec<&[f32]> = planar.iter().map(|channel| &channel[pos..]).collect();
        append(resampler.process_partial(Some(block.as_slice()), None)?);
    }
    append(resampler.process_partial(None::<&[Vec<f32>]>, None)?);

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.truncate(expected_frames);
    }

    Ok(interleave(&output))
}
