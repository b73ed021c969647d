//! Microphone capture using CPAL (Cross-Platform Audio Library).
//!
//! The data callback is the producer side of the pipeline: it converts
//! whatever the device delivers to 16-bit mono PCM at the configured rate,
//! runs it through the chunk assembler, and pushes completed chunks into the
//! ingest queue. It does nothing else; the callback must stay fast and
//! non-blocking.

use crate::audio::chunker::{ChunkAssembler, ChunkerConfig};
use crate::audio::wav::resample;
use crate::error::{LivecapError, Result};
use crate::transcript::pcm;
use crate::transcript::queue::ChunkQueue;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers while
/// probing audio backends. The messages are harmless but confusing.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2.
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Quiet down JACK/ALSA/PipeWire probing noise.
///
/// # Safety
/// Modifies environment variables; call at startup before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns that are never useful for voice input.
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List available audio input devices, filtered and with recommendations.
///
/// Unusable devices (surround channels, HDMI outputs) are dropped;
/// PipeWire/PulseAudio devices are marked `[recommended]`.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| LivecapError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio so the
/// desktop's device selection is respected.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| LivecapError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from the thread that owns the
/// capture; it never crosses thread boundaries while in use.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture feeding the ingest queue.
///
/// Captures 16-bit mono at the configured sample rate. Tries the preferred
/// format first (i16, then f32), then falls back to the device's native
/// config with software channel mixing and resampling (some PipeWire-ALSA
/// setups accept non-native configs but never deliver data).
pub struct CpalCapture {
    device: cpal::Device,
    queue: Arc<ChunkQueue>,
    chunker: ChunkerConfig,
    stream: Option<SendableStream>,
    callback_count: Arc<AtomicU64>,
}

impl CpalCapture {
    /// Create a capture for the named device, or the best default.
    ///
    /// # Errors
    /// `AudioDeviceNotFound` when the named device does not exist,
    /// `AudioCapture` when enumeration fails.
    pub fn new(
        device_name: Option<&str>,
        chunker: ChunkerConfig,
        queue: Arc<ChunkQueue>,
    ) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| LivecapError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        return Ok(dev);
                    }
                }

                Err(LivecapError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            queue,
            chunker,
            stream: None,
            callback_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The chunk-pushing data callback, shared by every stream format.
    fn make_callback(&self) -> impl FnMut(&[i16]) + Send + 'static + use<> {
        chunk_callback(
            Arc::clone(&self.queue),
            Arc::clone(&self.callback_count),
            self.chunker,
        )
    }

    /// Build the stream with the preferred format (mono at the target rate).
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.chunker.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // i16 mono — PipeWire/PulseAudio convert transparently
        let mut on_samples = self.make_callback();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                on_samples(data);
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32 mono — for devices that only expose float formats
        let mut on_samples = self.make_callback();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                on_samples(&converted);
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native()
    }

    /// Build a stream at the device's native config, converting in software.
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.chunker.sample_rate;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "livecap: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        match default_config.sample_format() {
            SampleFormat::I16 => {
                let mut on_samples = self.make_callback();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            let converted = convert_to_target_mono(
                                data,
                                native_channels,
                                native_rate,
                                target_rate,
                            );
                            on_samples(&converted);
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| LivecapError::AudioCapture {
                        message: format!("Failed to build native i16 stream: {}", e),
                    })
            }
            SampleFormat::F32 => {
                let mut on_samples = self.make_callback();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            let i16_data: Vec<i16> = data
                                .iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                                .collect();
                            let converted = convert_to_target_mono(
                                &i16_data,
                                native_channels,
                                native_rate,
                                target_rate,
                            );
                            on_samples(&converted);
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| LivecapError::AudioCapture {
                        message: format!("Failed to build native f32 stream: {}", e),
                    })
            }
            fmt => Err(LivecapError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }

    /// Start capturing. Fatal errors here surface before the loop starts.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(()); // Already started
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| LivecapError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        // Wait briefly to check that the callback actually fires. Some
        // PipeWire-ALSA setups accept non-native configs but never deliver.
        std::thread::sleep(std::time::Duration::from_millis(200));

        let final_stream = if self.callback_count.load(Ordering::Relaxed) == 0 {
            drop(stream);
            let native_stream = self.build_stream_native()?;
            native_stream
                .play()
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to start native audio stream: {}", e),
                })?;
            native_stream
        } else {
            stream
        };

        self.stream = Some(SendableStream(final_stream));
        Ok(())
    }

    /// Stop capturing.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.0.pause().map_err(|e| LivecapError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }
}

/// Assemble callback frames into bounded chunks and enqueue them.
fn chunk_callback(
    queue: Arc<ChunkQueue>,
    counter: Arc<AtomicU64>,
    chunker: ChunkerConfig,
) -> impl FnMut(&[i16]) + Send + 'static {
    let mut assembler = ChunkAssembler::new(chunker);
    move |samples: &[i16]| {
        counter.fetch_add(1, Ordering::Relaxed);
        for chunk in assembler.feed(samples) {
            queue.push(pcm::samples_to_bytes(&chunk));
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_target_mono(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    let mono: Vec<i16> = if channels == 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        resample(&mono, source_rate, target_rate)
    }
}
