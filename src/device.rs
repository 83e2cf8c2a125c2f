//! CPAL device negotiation and stream creation.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, SupportedBufferSize, SupportedStreamConfig};
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::DeviceError;
use crate::renderer::Renderer;
use crate::sample::OutputSample;

/// The default output device with a negotiated stream configuration.
pub(crate) struct CpalDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: SampleFormat,
    name: String,
}

impl CpalDevice {
    /// Open the system default output and negotiate a config close to `requested`.
    ///
    /// Prefers the requested rate and channel count in f32, then i16, then u16. If the
    /// device offers nothing matching, its default config is used as is.
    pub(crate) fn open(requested: &EngineConfig) -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());

        let supported = match preferred_config(&device, requested)? {
            Some(supported) => supported,
            None => {
                let fallback = device.default_output_config()?;
                warn!(
                    device = %name,
                    requested_rate = requested.sample_rate,
                    requested_channels = requested.channels,
                    rate = fallback.sample_rate().0,
                    channels = fallback.channels(),
                    "Requested config not supported, using device default"
                );
                fallback
            }
        };

        let sample_format = supported.sample_format();
        if format_rank(sample_format).is_none() {
            return Err(DeviceError::UnsupportedFormat(format!("{:?}", sample_format)));
        }

        let mut config = supported.config();
        if let (Some(frames), SupportedBufferSize::Range { min, max }) =
            (requested.buffer_frames, supported.buffer_size())
        {
            if (*min..=*max).contains(&frames) {
                config.buffer_size = BufferSize::Fixed(frames);
            }
        }

        info!(
            device = %name,
            rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            buffer = ?config.buffer_size,
            "Opened output device"
        );

        Ok(Self {
            device,
            config,
            sample_format,
            name,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub(crate) fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Build a paused output stream driven by `renderer`.
    pub(crate) fn build_stream(&self, renderer: Renderer) -> Result<cpal::Stream, DeviceError> {
        match self.sample_format {
            SampleFormat::F32 => self.build::<f32>(renderer),
            SampleFormat::I16 => self.build::<i16>(renderer),
            SampleFormat::U16 => self.build::<u16>(renderer),
            other => Err(DeviceError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    fn build<T>(&self, mut renderer: Renderer) -> Result<cpal::Stream, DeviceError>
    where
        T: OutputSample + cpal::SizedSample,
    {
        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| renderer.render(data),
            |err| error!("Audio stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::F32 => Some(0),
        SampleFormat::I16 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

fn preferred_config(
    device: &cpal::Device,
    requested: &EngineConfig,
) -> Result<Option<SupportedStreamConfig>, DeviceError> {
    let rate = SampleRate(requested.sample_rate);
    let best = device
        .supported_output_configs()?
        .filter(|range| range.channels() == requested.channels)
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter_map(|range| format_rank(range.sample_format()).map(|rank| (rank, range)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, range)| range.with_sample_rate(rate));
    Ok(best)
}
