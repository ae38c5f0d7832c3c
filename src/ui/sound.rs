/// Sound engine: procedural sound effects via rodio.
///
/// Fixed sounds are generated as in-memory WAV buffers at init time; the
/// jump sweep is rendered per jump because its pitch follows the charge.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::domain::tile::Surface;
use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_land: Arc<Vec<u8>>,
        sfx_land_ice: Arc<Vec<u8>>,
        sfx_land_snow: Arc<Vec<u8>>,
        sfx_steps: Vec<Arc<Vec<u8>>>,
        sfx_bounce: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_select: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_land: Arc::new(make_wav(&gen_thud(140.0, 0.6))),
                sfx_land_ice: Arc::new(make_wav(&gen_clink())),
                sfx_land_snow: Arc::new(make_wav(&gen_thud(90.0, 1.0))),
                sfx_steps: [0.9_f32, 1.0, 1.12]
                    .iter()
                    .map(|&pitch| Arc::new(make_wav(&gen_step(pitch))))
                    .collect(),
                sfx_bounce: Arc::new(make_wav(&gen_bounce())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_select: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.2))),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_owned(buf.as_ref().clone());
        }

        fn play_owned(&self, buf: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf)) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Rising sweep; a fuller charge starts lower and climbs further.
        pub fn play_jump(&self, power: f64) {
            self.play_owned(make_wav(&gen_jump((power as f32).clamp(0.0, 1.0))));
        }

        pub fn play_land(&self, surface: super::Surface) {
            match surface {
                super::Surface::Ice => self.play(&self.sfx_land_ice),
                super::Surface::Snow => self.play(&self.sfx_land_snow),
                _ => self.play(&self.sfx_land),
            }
        }

        pub fn play_step(&self, index: u32) {
            if let Some(buf) = self.sfx_steps.get(index as usize % self.sfx_steps.len()) {
                self.play(buf);
            }
        }

        pub fn play_bounce(&self) { self.play(&self.sfx_bounce); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_select(&self) { self.play(&self.sfx_select); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Jump: square-ish upward sweep
    fn gen_jump(power: f32) -> Vec<f32> {
        let n = samples_for(0.08 + power * 0.1);
        let (from, to) = (420.0 - power * 120.0, 700.0 + power * 500.0);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                let wave = (phase * TAU).sin() * 0.7 + (phase * 3.0 * TAU).sin() * 0.3;
                wave * (1.0 - t).powf(0.7) * 0.22
            })
            .collect()
    }

    /// Landing: low sine drop with a noise transient
    fn gen_thud(freq: f32, noise_mix: f32) -> Vec<f32> {
        let n = samples_for(0.09);
        let mut rng: u32 = 7919;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * (1.0 - t * 0.4) * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let burst = if t < 0.2 { noise * noise_mix } else { 0.0 };
                (tone * 0.7 + burst * 0.3) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Ice landing: bright two-partial clink
    fn gen_clink() -> Vec<f32> {
        let n = samples_for(0.14);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wave = (ti * 2093.0 * TAU).sin() * 0.6 + (ti * 3136.0 * TAU).sin() * 0.4;
                wave * (1.0 - t).powf(2.0) * 0.2
            })
            .collect()
    }

    /// Footstep: filtered noise tick
    fn gen_step(pitch: f32) -> Vec<f32> {
        let n = samples_for(0.035);
        let mut rng: u32 = (pitch * 10_000.0) as u32;
        let mut smooth = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                // One-pole low-pass; higher pitch lets more through
                smooth += (noise - smooth) * (0.25 * pitch);
                smooth * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Wall bounce: wobbling "boing"
    fn gen_bounce() -> Vec<f32> {
        let n = samples_for(0.16);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 260.0 + (ti * 28.0 * TAU).sin() * 60.0 + t * 140.0;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Level clear: ascending arpeggio with a held top note
    fn gen_win() -> Vec<f32> {
        let notes = [587.0_f32, 740.0, 880.0, 1175.0]; // D5→F#5→A5→D6
        let mut samples = Vec::new();
        for (k, &freq) in notes.iter().enumerate() {
            let dur = if k + 1 == notes.len() { 0.35 } else { 0.09 };
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * if k + 1 == notes.len() { 1.0 } else { 0.3 };
                let wave = (t * freq * TAU).sin() * 0.6
                    + (t * freq * 2.0 * TAU).sin() * 0.3
                    + (t * freq * 3.0 * TAU).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder, 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_blip(440.0, 0.01, 0.5);
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generators_stay_in_range() {
            for buf in [gen_jump(1.0), gen_thud(140.0, 0.6), gen_clink(), gen_step(1.12), gen_bounce(), gen_win()] {
                assert!(!buf.is_empty());
                assert!(buf.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self, _power: f64) {}
    pub fn play_land(&self, _surface: Surface) {}
    pub fn play_step(&self, _index: u32) {}
    pub fn play_bounce(&self) {}
    pub fn play_win(&self) {}
    pub fn play_select(&self) {}
}

impl SoundEngine {
    /// Play whatever a simulation event calls for.
    pub fn handle(&self, event: &GameEvent) {
        match event {
            GameEvent::Jumped { power } => self.play_jump(*power),
            GameEvent::Landed { surface } => self.play_land(*surface),
            GameEvent::Footstep { index } => self.play_step(*index),
            GameEvent::WallBounce => self.play_bounce(),
            GameEvent::Won => self.play_win(),
            GameEvent::Paused | GameEvent::Resumed => self.play_select(),
        }
    }
}
