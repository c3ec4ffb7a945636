//! Audio device setup: the renderer runs inside the cpal callback

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use tenkey::{
    audio::{self, RealtimeContext},
    MAX_BLOCK_SIZE,
};

/// Render messages in flight between the control and audio threads
const MESSAGE_CAPACITY: usize = 1024;

/// Scope samples buffered between UI ticks
const SCOPE_CAPACITY: usize = 16_384;

/// A running output stream and its scope tap.
pub struct AudioOutput {
    // Audio stops when this is dropped
    _stream: cpal::Stream,
    pub sample_rate: f32,
    pub channels: usize,
    /// Mono render output, for the waveform and spectrum views
    pub scope: Consumer<f32>,
}

/// Open the default output device and start rendering.
///
/// Returns the context the session schedules onto; the matching renderer has
/// already moved into the device callback.
pub fn start_audio(master_gain: f32) -> EyreResult<(RealtimeContext, AudioOutput)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    log::info!(
        "output device '{}': {sample_rate} Hz, {channels} channels",
        device.name().unwrap_or_else(|_| "unknown".into())
    );

    let (context, mut renderer) = audio::realtime(sample_rate, MESSAGE_CAPACITY);
    renderer = renderer.with_master_gain(master_gain);
    let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY);

    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    renderer.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Scope is best-effort; drop samples if the UI lags
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    stream.play().wrap_err("failed to start output stream")?;

    Ok((
        context,
        AudioOutput {
            _stream: stream,
            sample_rate,
            channels,
            scope: scope_rx,
        },
    ))
}
