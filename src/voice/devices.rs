//! Input device enumeration and selection

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait};

use crate::{Error, Result};

/// Summary of one audio input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Position in the host's device list, usable as a selector
    pub index: usize,
    pub name: String,
    /// Default capture rate, if the device reports one
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub is_default: bool,
}

impl fmt::Display for InputDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_default { '*' } else { ' ' };
        write!(f, "{marker} [{}] {}", self.index, self.name)?;
        if let (Some(rate), Some(channels)) = (self.sample_rate, self.channels) {
            write!(f, " ({rate} Hz, {channels} ch)")?;
        }
        Ok(())
    }
}

/// List every input device on the default host
///
/// # Errors
///
/// Returns error if the host cannot enumerate devices
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| Error::Audio(e.to_string()))?;

    Ok(devices
        .enumerate()
        .map(|(index, device)| {
            let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
            let config = device.default_input_config().ok();
            InputDeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                sample_rate: config.as_ref().map(|c| c.sample_rate().0),
                channels: config.as_ref().map(cpal::SupportedStreamConfig::channels),
            }
        })
        .collect())
}

/// How a device was asked for on the command line or in config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Default,
    Index(usize),
    /// Case-insensitive fragment of the device name
    Name(String),
}

impl DeviceSelector {
    /// Interpret a user-supplied selector
    ///
    /// Digits select by index, anything else matches by name.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Default,
            Some(s) => s
                .parse()
                .map_or_else(|_| Self::Name(s.to_lowercase()), Self::Index),
        }
    }
}

/// Resolve a selector to a device on `host`
///
/// # Errors
///
/// Returns [`Error::Audio`] if no device matches
pub fn select_input_device(host: &cpal::Host, selector: &DeviceSelector) -> Result<cpal::Device> {
    match selector {
        DeviceSelector::Default => host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string())),
        DeviceSelector::Index(index) => host
            .input_devices()
            .map_err(|e| Error::Audio(e.to_string()))?
            .nth(*index)
            .ok_or_else(|| Error::Audio(format!("no input device at index {index}"))),
        DeviceSelector::Name(fragment) => host
            .input_devices()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|d| {
                d.name()
                    .is_ok_and(|name| name.to_lowercase().contains(fragment.as_str()))
            })
            .ok_or_else(|| Error::Audio(format!("no input device matching \"{fragment}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(DeviceSelector::parse(None), DeviceSelector::Default);
        assert_eq!(DeviceSelector::parse(Some("  ")), DeviceSelector::Default);
        assert_eq!(DeviceSelector::parse(Some("2")), DeviceSelector::Index(2));
        assert_eq!(
            DeviceSelector::parse(Some("USB Mic")),
            DeviceSelector::Name("usb mic".to_string())
        );
    }

    #[test]
    fn test_info_display() {
        let info = InputDeviceInfo {
            index: 1,
            name: "USB Audio".to_string(),
            sample_rate: Some(48000),
            channels: Some(1),
            is_default: true,
        };
        assert_eq!(info.to_string(), "* [1] USB Audio (48000 Hz, 1 ch)");
    }
}
