//! Microphone capture via CPAL, re-chunked to fixed-size sample buffers.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::mpsc::Sender;
use tracing::{info, warn};
use vigil_core::{AudioSettings, VigilError, VigilResult};

pub struct AudioCapture {
    device: Device,
    stream_config: StreamConfig,
    chunk_size: usize,
}

impl AudioCapture {
    /// Open the default input device. A missing device surfaces as
    /// `Unavailable` so the caller can disable the channel non-fatally.
    pub fn new(settings: &AudioSettings) -> VigilResult<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VigilError::Unavailable("no audio input device".to_string()))?;

        info!(
            device = device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate = settings.sample_rate,
            chunk = settings.chunk_size,
            "audio capture initialized"
        );

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(settings.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            stream_config,
            chunk_size: settings.chunk_size,
        })
    }

    /// Start the input stream, sending `chunk_size`-sample buffers until the
    /// returned stream is dropped. Stream errors are reported, never fatal.
    pub fn start(&self, chunk_tx: Sender<Vec<f32>>) -> VigilResult<Stream> {
        let chunk_size = self.chunk_size;
        let mut sample_buffer: Vec<f32> = Vec::with_capacity(chunk_size);

        let stream = self
            .device
            .build_input_stream(
                &self.stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data {
                        sample_buffer.push(sample);
                        if sample_buffer.len() >= chunk_size {
                            let chunk = std::mem::replace(
                                &mut sample_buffer,
                                Vec::with_capacity(chunk_size),
                            );
                            if chunk_tx.send(chunk).is_err() {
                                // Receiver gone: the channel is shutting down.
                                return;
                            }
                        }
                    }
                },
                move |err| warn!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| VigilError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VigilError::Stream(e.to_string()))?;
        Ok(stream)
    }
}
