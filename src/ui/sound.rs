/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_catch: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_select: Arc<Vec<u8>>,
        sfx_start: Arc<Vec<u8>>,
        sfx_time_up: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_catch: Arc::new(make_wav(&gen_catch())),
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_select: Arc::new(make_wav(&gen_blip(660.0, 0.04, 0.25))),
                sfx_start: Arc::new(make_wav(&gen_start())),
                sfx_time_up: Arc::new(make_wav(&gen_time_up())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_catch(&self) { self.play(&self.sfx_catch); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_select(&self) { self.play(&self.sfx_select); }
        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_time_up(&self) { self.play(&self.sfx_time_up); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Sequence of notes, each with a fading sine plus one harmonic.
    fn gen_notes(notes: &[(f32, f32)], harmonic: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                    + (t * freq * 2.0 * TAU).sin() * harmonic;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Catch: quick ascending arpeggio C6 E6 G6
    fn gen_catch() -> Vec<f32> {
        gen_notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.06)], 0.3, 0.25)
    }

    /// Jump: short rising sweep
    fn gen_jump() -> Vec<f32> {
        let duration = 0.1;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 250.0 + t * 450.0;
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (phase * TAU).sin() * env * 0.2
            })
            .collect()
    }

    /// Session start: ascending fanfare C5 E5 G5 C6
    fn gen_start() -> Vec<f32> {
        gen_notes(
            &[(523.0, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.25)],
            0.3,
            0.3,
        )
    }

    /// Time up: descending A4 F#4 Eb4 C4
    fn gen_time_up() -> Vec<f32> {
        gen_notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.3)], 0.1, 0.3)
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_and_size() {
            let wav = make_wav(&[0.0, 1.0, -2.0]);
            assert_eq!(&wav[..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            // out-of-range samples are clamped
            assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), 32767);
            assert_eq!(i16::from_le_bytes([wav[48], wav[49]]), -32767);
        }

        #[test]
        fn note_sequence_length() {
            let samples = gen_notes(&[(440.0, 0.1), (880.0, 0.1)], 0.0, 0.5);
            assert_eq!(samples.len(), 2 * (SAMPLE_RATE as f32 * 0.1) as usize);
            assert!(samples.iter().all(|s| s.abs() <= 0.5));
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API, compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_catch(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_select(&self) {}
    pub fn play_start(&self) {}
    pub fn play_time_up(&self) {}
}
