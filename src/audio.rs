//! Microphone access
//!
//! A session only starts once microphone access has been confirmed. With the
//! `microphone` feature the check opens the default cpal input device;
//! otherwise access is assumed (console and scripted recognizers need none).

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Permission check performed before every session start
#[async_trait]
pub trait MicrophoneAccess: Send + Sync {
    /// Resolve once the microphone may be used; errors mean access was refused
    async fn request(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// For recognizers that do not capture audio themselves
#[derive(Debug, Default)]
pub struct AssumeGranted;

#[async_trait]
impl MicrophoneAccess for AssumeGranted {
    async fn request(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Pick the microphone check for this build
pub fn create_microphone(check_device: bool) -> Arc<dyn MicrophoneAccess> {
    if check_device {
        #[cfg(feature = "microphone")]
        {
            info!("🎤 Probing the default input device before each session");
            return Arc::new(capture::CpalMicrophone);
        }
        #[cfg(not(feature = "microphone"))]
        info!("🎤 Built without microphone support, skipping device check");
    }
    Arc::new(AssumeGranted)
}

/// RMS energy of a block of samples
pub fn calculate_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}

#[cfg(feature = "microphone")]
pub mod capture {
    //! cpal-backed device checks

    use super::{calculate_energy, MicrophoneAccess};
    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::{info, warn};

    /// Names of all input devices on the default host
    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        Ok(host
            .input_devices()?
            .map(|d| d.name().unwrap_or_else(|_| "Unknown".to_string()))
            .collect())
    }

    /// Record from the default input device and return the RMS energy
    pub fn test_capture(duration: Duration) -> Result<f32> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No default input device")?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let supported = device.default_input_config()?;
        info!("Recording from {} ({:?})", device_name, supported);

        let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
        let config: cpal::StreamConfig = supported.clone().into();
        let on_error = |err| warn!("Audio stream error: {}", err);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::I16 => {
                let sink = samples.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(data);
                        }
                    },
                    on_error,
                    None,
                )?
            }
            cpal::SampleFormat::F32 => {
                let sink = samples.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend(data.iter().map(|s| (s * i16::MAX as f32) as i16));
                        }
                    },
                    on_error,
                    None,
                )?
            }
            other => anyhow::bail!("Unsupported sample format {:?}", other),
        };

        stream.play()?;
        std::thread::sleep(duration);
        drop(stream);

        let buf = samples
            .lock()
            .map_err(|_| anyhow::anyhow!("sample buffer poisoned"))?;
        Ok(calculate_energy(&buf))
    }

    /// Confirms a default input device exists and reports a usable config
    #[derive(Debug, Default)]
    pub struct CpalMicrophone;

    #[async_trait]
    impl MicrophoneAccess for CpalMicrophone {
        async fn request(&self) -> Result<()> {
            tokio::task::spawn_blocking(|| -> Result<()> {
                let host = cpal::default_host();
                let device = host
                    .default_input_device()
                    .context("No default input device")?;
                device
                    .default_input_config()
                    .context("Input device refused configuration")?;
                Ok(())
            })
            .await?
        }

        fn name(&self) -> &str {
            "cpal"
        }
    }
}
