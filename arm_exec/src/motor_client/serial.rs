//! Serial port implementation of the motor link

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serialport::SerialPort;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::time::Duration;

use super::{MotorParams, MotorPort};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Motor link over a serial device.
pub struct SerialMotorPort {
    params: MotorParams,

    port: Option<BufReader<Box<dyn SerialPort>>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SerialMotorPort {
    /// Create a new port, the device is not opened until [`MotorPort::connect`] is called.
    pub fn new(params: &MotorParams) -> Self {
        Self {
            params: params.clone(),
            port: None,
        }
    }

    /// Wrap a device which is already open.
    pub fn from_port(params: &MotorParams, port: Box<dyn SerialPort>) -> Self {
        Self {
            params: params.clone(),
            port: Some(BufReader::new(port)),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.params.port_name
    }

    /// Close the port after an I/O error so the link reports itself as disconnected.
    fn check_io<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &result {
            warn!(
                "I/O error on motor link {}, closing it: {}",
                self.params.port_name, e
            );
            self.port = None;
        }
        result
    }
}

impl MotorPort for SerialMotorPort {
    fn connect(&mut self) -> io::Result<()> {
        let port = serialport::new(&self.params.port_name, self.params.baud_rate)
            .timeout(Duration::from_millis(self.params.timeout_ms))
            .open()?;

        info!(
            "Opened motor link on {} at {} baud",
            self.params.port_name, self.params.baud_rate
        );

        self.port = Some(BufReader::new(port));
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.port.take().is_some() {
            info!("Closed motor link on {}", self.params.port_name);
        }
    }

    /// Connected while the port is open and no read or write on it has failed.
    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port is not open"))?;

        let inner = port.get_mut();
        let result = inner.write_all(line.as_bytes()).and_then(|_| inner.flush());
        self.check_io(result)
    }

    fn read_line(&mut self) -> io::Result<String> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port is not open"))?;

        let mut line = String::new();
        let result = match port.read_line(&mut line) {
            Ok(_) => Ok(line),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if !line.is_empty() {
                    warn!("Timed out part way through a line from the motor controller");
                }
                Ok(line)
            }
            Err(e) => Err(e),
        };
        self.check_io(result)
    }
}

/// Check whether a serial device exists on the system.
///
/// Symlinks such as `/dev/serial/by-id/...` are resolved before comparing against the enumerated
/// devices. A device node which exists but isn't enumerated (a pty for example) also counts.
pub fn port_present(port_name: &str) -> bool {
    match serialport::available_ports() {
        Ok(ports) => {
            ports.iter().any(|p| same_device(&p.port_name, port_name))
                || Path::new(port_name).exists()
        }
        Err(e) => {
            debug!("Could not enumerate serial ports: {}", e);
            Path::new(port_name).exists()
        }
    }
}

/// True if both names refer to the same device once links are resolved.
fn same_device(a: &str, b: &str) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
