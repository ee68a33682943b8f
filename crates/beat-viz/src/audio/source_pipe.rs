//! Audio device capture and stream management.
//!
//! Handles audio input from system devices using cpal, managing device enumeration,
//! stream creation, and a mono ring buffer for sample storage.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;

/// Samples kept in the ring; one FFT frame.
pub const BUFFER_SIZE: usize = 2048;

pub struct DeviceInfo {
    pub device: cpal::Device,
    pub name: String,
    pub is_input: bool,
}

pub struct SourcePipe {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    devices: Vec<DeviceInfo>,
    current_device: usize,
    _stream: Option<Stream>,
    // Auto-gain normalization state
    smoothed_peak: f32,
    target_level: f32,
}

impl SourcePipe {
    pub fn new() -> Self {
        let devices = Self::collect_devices();
        let buffer = Arc::new(Mutex::new(VecDeque::from(vec![0.0; BUFFER_SIZE])));

        // Try the last used device first
        let config = Config::load();
        let start_index = config
            .last_device
            .as_ref()
            .and_then(|name| {
                let is_input = config.last_device_is_input.unwrap_or(false);
                devices
                    .iter()
                    .position(|d| d.name == *name && d.is_input == is_input)
            })
            .or_else(|| {
                // Prefer pipewire or pulse input devices (more reliable on Linux)
                devices
                    .iter()
                    .position(|d| d.is_input && d.name == "pipewire")
            })
            .or_else(|| devices.iter().position(|d| d.is_input && d.name == "pulse"))
            .or_else(|| {
                let host = cpal::default_host();
                let default_input = host.default_input_device().and_then(|d| d.name().ok());
                default_input.and_then(|name| devices.iter().position(|d| d.is_input && d.name == name))
            })
            .unwrap_or(0);

        let stream = if devices.is_empty() {
            error!("no audio devices found, rendering silence");
            None
        } else {
            Self::build_stream(&devices[start_index], Arc::clone(&buffer), config.device_timeout_secs())
        };

        if stream.is_some() {
            let info = &devices[start_index];
            let kind = if info.is_input { "input" } else { "output" };
            info!(index = start_index, device = %info.name, kind, "audio device selected");
        }

        Self {
            buffer,
            devices,
            current_device: start_index,
            _stream: stream,
            smoothed_peak: 0.1,
            target_level: 0.5,
        }
    }

    pub fn list_devices() {
        let host = cpal::default_host();
        let mut idx = 0;
        if let Ok(inputs) = host.input_devices() {
            for device in inputs {
                if let Ok(name) = device.name() {
                    info!("  [{}] {} (input)", idx, name);
                    idx += 1;
                }
            }
        }
        if let Ok(outputs) = host.output_devices() {
            for device in outputs {
                if let Ok(name) = device.name() {
                    info!("  [{}] {} (output)", idx, name);
                    idx += 1;
                }
            }
        }
        info!("use 0-9 (Shift for +10) to switch devices");
    }

    fn collect_devices() -> Vec<DeviceInfo> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        if let Ok(input_devices) = host.input_devices() {
            for device in input_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: true,
                    });
                }
            }
        }

        if let Ok(output_devices) = host.output_devices() {
            for device in output_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: false,
                    });
                }
            }
        }

        devices
    }

    /// Get device config with timeout (the config call often hangs on bad devices)
    fn get_config_with_timeout(device: &Device, is_input: bool, timeout: Duration) -> Option<StreamConfig> {
        let device_clone = device.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let config = if is_input {
                device_clone.default_input_config()
            } else {
                device_clone.default_output_config()
            };
            let _ = tx.send(config);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(config)) => Some(config.into()),
            Ok(Err(e)) => {
                warn!(error = %e, "failed to get device config");
                None
            }
            Err(_) => {
                warn!(?timeout, "device config timed out");
                None
            }
        }
    }

    fn build_stream(
        device_info: &DeviceInfo,
        audio_buffer: Arc<Mutex<VecDeque<f32>>>,
        timeout_secs: u64,
    ) -> Option<Stream> {
        let stream_config = Self::get_config_with_timeout(
            &device_info.device,
            device_info.is_input,
            Duration::from_secs(timeout_secs),
        )?;
        let channels = (stream_config.channels as usize).max(1);

        let err_fn = |err: cpal::StreamError| error!(error = %err, "audio stream error");

        let stream = device_info.device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let Ok(mut buffer) = audio_buffer.lock() else {
                    return;
                };
                for chunk in data.chunks(channels) {
                    let sample: f32 = chunk.iter().sum::<f32>() / channels as f32;
                    buffer.pop_front();
                    buffer.push_back(sample);
                }
            },
            err_fn,
            None,
        );

        match stream {
            Ok(s) => {
                if let Err(e) = s.play() {
                    warn!(error = %e, "failed to play stream");
                    return None;
                }
                Some(s)
            }
            Err(e) => {
                warn!(error = %e, "failed to build stream");
                None
            }
        }
    }

    /// Attempts to select a device.
    /// Returns Some((device_name, success)) if a switch was attempted, None if index invalid.
    pub fn select_device(&mut self, index: usize) -> Option<(String, bool)> {
        let info = self.devices.get(index)?;
        if index == self.current_device {
            return Some((info.name.clone(), true));
        }

        let device_name = info.name.clone();
        let is_input = info.is_input;
        info!(index, device = %device_name, is_input, "switching audio device");

        if let Ok(mut buf) = self.buffer.lock() {
            buf.iter_mut().for_each(|x| *x = 0.0);
        }

        let mut config = Config::load();
        match Self::build_stream(info, Arc::clone(&self.buffer), config.device_timeout_secs()) {
            Some(stream) => {
                self._stream = Some(stream);
                self.current_device = index;
                config.set_device(&device_name, is_input);
                Some((device_name, true))
            }
            None => {
                warn!(index, device = %device_name, "device switch failed");
                Some((device_name, false))
            }
        }
    }

    /// Current samples with auto-gain normalization applied.
    pub fn stream(&mut self) -> Vec<f32> {
        let buffer: Vec<f32> = match self.buffer.lock() {
            Ok(buf) => buf.iter().copied().collect(),
            Err(_) => vec![0.0; BUFFER_SIZE],
        };

        let current_peak = buffer.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        self.smoothed_peak = track_peak(self.smoothed_peak, current_peak);

        let gain = (self.target_level / self.smoothed_peak.max(0.001)).clamp(0.5, 10.0);
        buffer.iter().map(|s| (s * gain).clamp(-1.0, 1.0)).collect()
    }
}

/// Fast attack when the signal gets louder, slow release when it gets quieter.
fn track_peak(smoothed: f32, current: f32) -> f32 {
    if current > smoothed {
        smoothed * 0.8 + current * 0.2
    } else {
        smoothed * 0.995 + current * 0.005
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracking_attacks_fast_and_releases_slow() {
        let up = track_peak(0.1, 1.0);
        assert!((up - 0.28).abs() < 1e-6);
        let down = track_peak(1.0, 0.0);
        assert!((down - 0.995).abs() < 1e-6);
    }
}
