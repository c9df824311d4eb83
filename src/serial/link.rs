// Write-only serial link. Frames are sent as-is and never acknowledged.

use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::dispatch::FrameSink;
use crate::error::{Error, Result};

/// Open serial device the frames are written to
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the device with 8N1 framing and no flow control
    pub fn open(port_name: &str, baudrate: u32, write_timeout: Duration) -> Result<Self> {
        info!("Opening serial port {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(write_timeout)
            .open()
            .map_err(|source| Error::Open {
                port: port_name.to_string(),
                source,
            })?;

        Ok(Self { port })
    }

    /// Device name as reported by the OS, if any
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

}

impl FrameSink for SerialLink {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()
    }

    /// Flush pending output and release the device
    fn close(mut self) -> std::io::Result<()> {
        self.port.flush()?;
        debug!("Serial port {:?} closed", self.port.name());
        Ok(())
    }
}
