//! Sound device output backed by rodio.
//!
//! rodio's output stream is not `Send`, so it lives on a dedicated thread and
//! the engine talks to it over a channel.

use std::sync::mpsc::{self, Sender};
use std::thread;

use rodio::{buffer::SamplesBuffer, OutputStream, Sink, Source};
use tracing::{debug, warn};

use super::audio::{AudioOutput, Clip};

enum PlaybackCommand {
    Play(Clip),
    Loop(Clip),
    StopLoop,
}

fn to_source(clip: Clip) -> SamplesBuffer<f32> {
    SamplesBuffer::new(1, clip.sample_rate, clip.samples)
}

/// Audio output on the default system device
#[derive(Default)]
pub struct RodioOutput {
    tx: Option<Sender<PlaybackCommand>>,
}

impl RodioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_thread() -> Result<Sender<PlaybackCommand>, String> {
        let (tx, rx) = mpsc::channel::<PlaybackCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("dial-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("Failed to open audio device: {}", e)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let mut alarm: Option<Sink> = None;

                while let Ok(command) = rx.recv() {
                    match command {
                        PlaybackCommand::Play(clip) => match Sink::try_new(&handle) {
                            Ok(sink) => {
                                sink.append(to_source(clip));
                                sink.detach();
                            }
                            Err(e) => warn!("Failed to create audio sink: {}", e),
                        },
                        PlaybackCommand::Loop(clip) => {
                            if let Some(old) = alarm.take() {
                                old.stop();
                            }
                            match Sink::try_new(&handle) {
                                Ok(sink) => {
                                    sink.append(to_source(clip).repeat_infinite());
                                    alarm = Some(sink);
                                }
                                Err(e) => warn!("Failed to create alarm sink: {}", e),
                            }
                        }
                        PlaybackCommand::StopLoop => {
                            if let Some(old) = alarm.take() {
                                old.stop();
                            }
                        }
                    }
                }
                debug!("Audio thread exiting");
            })
            .map_err(|e| e.to_string())?;

        ready_rx
            .recv()
            .map_err(|e| format!("Audio thread stopped during startup: {}", e))??;
        Ok(tx)
    }

    fn send(&self, command: PlaybackCommand) -> Result<(), String> {
        let tx = self.tx.as_ref().ok_or("audio output not initialized")?;
        tx.send(command).map_err(|e| e.to_string())
    }
}

impl AudioOutput for RodioOutput {
    fn init(&mut self) -> Result<(), String> {
        if self.tx.is_none() {
            self.tx = Some(Self::spawn_thread()?);
        }
        Ok(())
    }

    fn play(&mut self, clip: Clip) -> Result<(), String> {
        self.send(PlaybackCommand::Play(clip))
    }

    fn play_loop(&mut self, clip: Clip) -> Result<(), String> {
        self.send(PlaybackCommand::Loop(clip))
    }

    fn stop_loop(&mut self) -> Result<(), String> {
        self.send(PlaybackCommand::StopLoop)
    }
}
