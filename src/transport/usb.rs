//! USB Transportation.
use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};

use super::Transport;
use crate::constants::PACKET_SIZE;
use crate::device::DeviceProfile;
use crate::error::TransportError;

/// Zero means no timeout for libusb, a transfer blocks until the device answers.
const TIMEOUT: Duration = Duration::ZERO;

pub struct UsbTransport {
    device_handle: DeviceHandle<rusb::Context>,
    interface: u8,
    endpoint_in: u8,
    endpoint_out: u8,
}

fn matching_devices(
    context: &Context,
    profile: &DeviceProfile,
) -> Result<Vec<Device<Context>>, TransportError> {
    Ok(context
        .devices()?
        .iter()
        .filter(|device| {
            device
                .device_descriptor()
                .map(|desc| {
                    desc.vendor_id() == profile.vendor_id && desc.product_id() == profile.product_id
                })
                .unwrap_or(false)
        })
        .collect())
}

impl UsbTransport {
    pub fn scan_devices(profile: &DeviceProfile) -> Result<usize, TransportError> {
        let context = Context::new()?;

        let devices = matching_devices(&context, profile)?;
        for (i, device) in devices.iter().enumerate() {
            log::debug!("Found {} USB device #{}: [{:?}]", profile.name, i, device);
        }
        Ok(devices.len())
    }

    pub fn open_nth(profile: &DeviceProfile, nth: usize) -> Result<UsbTransport, TransportError> {
        let context = Context::new()?;

        let device = matching_devices(&context, profile)?
            .into_iter()
            .nth(nth)
            .ok_or(TransportError::DeviceNotFound {
                vendor_id: profile.vendor_id,
                product_id: profile.product_id,
                index: nth,
            })?;
        log::debug!("Found USB Device {:?}", device);

        let mut device_handle = device.open()?;

        if device_handle.kernel_driver_active(profile.interface).unwrap_or(false) {
            log::debug!("Detaching kernel driver from interface {}", profile.interface);
            device_handle.detach_kernel_driver(profile.interface)?;
        }
        device_handle.claim_interface(profile.interface)?;

        Ok(UsbTransport {
            device_handle,
            interface: profile.interface,
            endpoint_in: profile.endpoint_in,
            endpoint_out: profile.endpoint_out,
        })
    }

    pub fn open_any(profile: &DeviceProfile) -> Result<UsbTransport, TransportError> {
        Self::open_nth(profile, 0)
    }
}

impl Transport for UsbTransport {
    fn send_raw(&mut self, raw: &[u8; PACKET_SIZE]) -> Result<(), TransportError> {
        let nwritten = self
            .device_handle
            .write_interrupt(self.endpoint_out, raw, TIMEOUT)?;
        if nwritten != PACKET_SIZE {
            return Err(TransportError::ShortTransfer {
                direction: "write",
                len: nwritten,
            });
        }
        Ok(())
    }

    fn recv_raw(&mut self) -> Result<[u8; PACKET_SIZE], TransportError> {
        let mut buf = [0u8; PACKET_SIZE];
        let nread = self
            .device_handle
            .read_interrupt(self.endpoint_in, &mut buf, TIMEOUT)?;
        if nread != PACKET_SIZE {
            return Err(TransportError::ShortTransfer {
                direction: "read",
                len: nread,
            });
        }
        Ok(buf)
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if let Err(e) = self.device_handle.release_interface(self.interface) {
            log::debug!("release interface {}: {}", self.interface, e);
        }
    }
}
