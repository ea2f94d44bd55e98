use crate::audio::error::{AudioError, AudioResult};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use serde::{Deserialize, Serialize};

/// Information about an audio output device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Device identifier (unique name)
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Whether this is the default output device
    pub is_default: bool,
    /// Default sample rate, if the device reports one
    pub sample_rate: Option<u32>,
    /// Default channel count, if the device reports one
    pub channels: Option<u16>,
}

/// List all available output devices
///
/// # Errors
/// Returns `AudioError::DeviceNotFound` if no output devices are found.
/// Returns `AudioError::CpalError` if there's an error accessing devices.
///
/// # Example
/// ```no_run
/// use breathwork_lib::audio::device::list_output_devices;
///
/// for device in list_output_devices().unwrap() {
///     println!("Device: {} ({})", device.name, device.id);
/// }
/// ```
pub fn list_output_devices() -> AudioResult<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let devices: Vec<Device> = host.output_devices()?.collect();

    if devices.is_empty() {
        return Err(AudioError::DeviceNotFound);
    }

    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut audio_devices = Vec::with_capacity(devices.len());
    for device in devices {
        let name = device.name().map_err(|_| AudioError::InvalidDeviceName)?;
        let is_default = default_name.as_deref() == Some(name.as_str());
        let config = device.default_output_config().ok();

        audio_devices.push(AudioDevice {
            id: name.clone(),
            name,
            is_default,
            sample_rate: config.as_ref().map(|c| c.sample_rate().0),
            channels: config.as_ref().map(|c| c.channels()),
        });
    }

    Ok(audio_devices)
}

/// Find an output device by its ID (name), or the default device
pub(crate) fn find_output_device(host: &Host, device_id: Option<&str>) -> AudioResult<Device> {
    let Some(device_id) = device_id else {
        return host.default_output_device().ok_or(AudioError::DeviceNotFound);
    };

    host.output_devices()?
        .find(|d| d.name().map(|n| n == device_id).unwrap_or(false))
        .ok_or(AudioError::DeviceNotFound)
}
