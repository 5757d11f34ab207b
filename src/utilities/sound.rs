use std::f32::consts::PI;

use rodio::source::{Source, Zero};
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::utilities::config::BeepSettings;
use crate::utilities::session::Beeper;

pub fn create_beep_sound(settings: &BeepSettings) -> Vec<f32> {
    let sample_rate = settings.sample_rate;
    let samples = (sample_rate as u128 * settings.duration.as_millis() / 1000) as usize;

    let mut wave: Vec<f32> = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * settings.frequency * 2.0 * PI).sin() * settings.amplitude;
        wave.push(sample);
    }
    wave
}

struct Output {
    // Dropping the stream stops all playback, so it lives as long as the handle.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl Output {
    fn open() -> Result<Self, rodio::StreamError> {
        let (_stream, handle) = OutputStream::try_default()?;
        Ok(Self { _stream, handle })
    }
}

/// Plays beep sequences on the default output device. Without a device it
/// stays silent.
pub struct Speaker {
    output: Option<Output>,
    sink: Option<Sink>,
    beep: Vec<f32>,
    settings: BeepSettings,
}

impl Speaker {
    pub fn open(settings: BeepSettings) -> Self {
        let output = match Output::open() {
            Ok(output) => Some(output),
            Err(err) => {
                log::warn!("audio disabled, cannot open output device: {err}");
                None
            }
        };
        Self::with_output(output, settings)
    }

    pub fn muted(settings: BeepSettings) -> Self {
        Self::with_output(None, settings)
    }

    fn with_output(output: Option<Output>, settings: BeepSettings) -> Self {
        Self {
            output,
            sink: None,
            beep: create_beep_sound(&settings),
            settings,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    /// Drops whatever is still queued and starts over with an empty sink.
    fn reset(&mut self) -> Result<(), rodio::PlayError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        let Some(output) = &self.output else {
            return Ok(());
        };
        self.sink = Some(Sink::try_new(&output.handle)?);
        Ok(())
    }

    /// Reopens the output stream after a failed reset.
    fn recover(&mut self) -> bool {
        match Output::open() {
            Ok(output) => {
                self.output = Some(output);
                true
            }
            Err(err) => {
                log::warn!("cannot reopen audio output: {err}");
                false
            }
        }
    }

    fn queue_beeps(&self, sink: &Sink) {
        let rate = self.settings.sample_rate;
        for _ in 0..self.settings.count {
            sink.append(rodio::buffer::SamplesBuffer::new(1, rate, self.beep.clone()));
            sink.append(Zero::<f32>::new(1, rate).take_duration(self.settings.gap));
        }
    }
}

impl Beeper for Speaker {
    fn beep(&mut self) {
        if !self.is_enabled() {
            return;
        }

        if let Err(err) = self.reset() {
            log::debug!("audio reset failed, recovering: {err}");
            let retried = self.recover() && self.reset().is_ok();
            if !retried {
                log::warn!("skipping beep, audio output unavailable");
                return;
            }
        }

        if let Some(sink) = &self.sink {
            self.queue_beeps(sink);
        }
    }

    fn release(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.output = None;
    }
}
