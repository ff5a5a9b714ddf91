//! Batch decoder (spec.md §6): the unbounded-input entry point atop
//! `StreamingDecoder`, per Design Note §9 ("batch = unbounded engine fed
//! once with the full sample vector followed by flush").

use crate::config::StreamingOptions;
use crate::errors::ModeError;
use crate::events::SstvEvent;
use crate::image_buffer::DecodedImage;
use crate::streaming::StreamingDecoder;

/// Decode a complete, in-memory sample array. Returns `None` if no VIS or
/// timing lock was ever obtained (spec.md §7's "No signal" case, not an
/// error).
pub fn decode(samples: &[f32], options: StreamingOptions) -> Result<Option<DecodedImage>, ModeError> {
    let mut decoder = StreamingDecoder::new(options)?;

    // Batch decoding starts at the first VIS only (Design Note §9's open
    // question on backward extrapolation is resolved: that behavior is a
    // feature of the streaming path, not batch).
    const CHUNK: usize = 8192;
    for chunk in samples.chunks(CHUNK) {
        decoder.process(chunk);
    }

    Ok(decoder.flush())
}

/// Decode with an observer callback, for callers that want progress events
/// (mode-detected, line, image-complete) as well as the final image.
pub fn decode_with_events(
    samples: &[f32],
    options: StreamingOptions,
    on_event: impl FnMut(&SstvEvent) + 'static,
) -> Result<Option<DecodedImage>, ModeError> {
    let mut decoder = StreamingDecoder::new(options)?;
    decoder.events.set_callback(on_event);

    const CHUNK: usize = 8192;
    for chunk in samples.chunks(CHUNK) {
        decoder.process(chunk);
    }

    Ok(decoder.flush())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncoderOptions};
    use crate::modes::martin_m1;
    use crate::testsignal;

    #[test]
    fn decodes_a_synthetic_martin_m1_transmission() {
        let sample_rate = 48_000.0;
        let mode = martin_m1();
        let mut audio = testsignal::tone(1900.0, sample_rate, 0.3);
        testsignal::append_vis_header(&mut audio, sample_rate, mode.id);

        let width = mode.width as usize;
        let height = mode.height as usize;
        let rgb = vec![64u8; width * height * 3];
        let options = EncoderOptions {
            mode,
            sample_rate,
            add_calibration_header: false,
            add_vox_tones: false,
        };
        let video = encode(&options, &rgb, mode.width, mode.height).expect("encode");
        audio.extend(video);

        let result = decode(
            &audio,
            StreamingOptions {
                sample_rate,
                ..StreamingOptions::default()
            },
        )
        .expect("valid forced mode")
        .expect("should lock onto a mode");
        assert_eq!(result.mode_name, "Martin M1");
        assert!(result.lines_decoded >= 1);
    }

    #[test]
    fn returns_none_for_pure_silence() {
        let sample_rate = 48_000.0;
        let silence = vec![0.0f32; sample_rate as usize];
        let result = decode(
            &silence,
            StreamingOptions {
                sample_rate,
                ..StreamingOptions::default()
            },
        )
        .unwrap();
        assert!(result.is_none());
    }
}
