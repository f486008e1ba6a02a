use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{DeviceError, Radio, Rotor};
use crate::tracker::{AzEl, Filter, Mode, Vfo};

const TIMEOUT: Duration = Duration::from_secs(2);

struct Connection {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

/// Line-oriented client for the hamlib network daemons. Connects on first
/// use and drops the connection on any I/O error so the next call retries.
struct LineClient {
    address: String,
    conn: Option<Connection>,
}

impl LineClient {
    fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            conn: None,
        }
    }

    fn connect(&mut self) -> Result<&mut Connection, DeviceError> {
        if self.conn.is_none() {
            let addr = self
                .address
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| DeviceError::Unavailable(self.address.clone()))?;
            let stream = TcpStream::connect_timeout(&addr, TIMEOUT)?;
            stream.set_read_timeout(Some(TIMEOUT))?;
            stream.set_write_timeout(Some(TIMEOUT))?;
            let reader = BufReader::new(stream.try_clone()?);
            log::info!("Connected to {}", self.address);
            self.conn = Some(Connection { stream, reader });
        }
        self.conn
            .as_mut()
            .ok_or_else(|| DeviceError::Unavailable(self.address.clone()))
    }

    fn is_connected(&mut self) -> bool {
        match self.connect() {
            Ok(_) => true,
            Err(e) => {
                log::debug!("{} unavailable: {}", self.address, e);
                false
            }
        }
    }

    /// Send one command and collect `lines` reply lines. A `RPRT` line ends
    /// the reply early; a non-zero code is an error.
    fn request(&mut self, command: &str, lines: usize) -> Result<Vec<String>, DeviceError> {
        let result = self.exchange(command, lines);
        if matches!(result, Err(DeviceError::Io(_))) {
            self.conn = None;
        }
        result
    }

    fn exchange(&mut self, command: &str, lines: usize) -> Result<Vec<String>, DeviceError> {
        let conn = self.connect()?;
        writeln!(conn.stream, "{}", command)?;
        conn.stream.flush()?;

        let mut reply = Vec::with_capacity(lines);
        while reply.len() < lines {
            let mut line = String::new();
            if conn.reader.read_line(&mut line)? == 0 {
                return Err(DeviceError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            let line = line.trim().to_string();
            if let Some(code) = line.strip_prefix("RPRT ") {
                let code: i32 = code
                    .trim()
                    .parse()
                    .map_err(|_| DeviceError::Parse(line.clone()))?;
                if code != 0 {
                    return Err(DeviceError::Rejected {
                        command: command.to_string(),
                        code,
                    });
                }
                break;
            }
            reply.push(line);
        }
        Ok(reply)
    }

    fn command(&mut self, command: &str) -> Result<(), DeviceError> {
        self.request(command, 1).map(|_| ())
    }
}

fn hamlib_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::CwReverse => "CWR",
        other => other.into(),
    }
}

/// Passband argument for `M`; 0 asks the rig for its default.
fn passband_hz(filter: Option<Filter>) -> u32 {
    match filter {
        Some(Filter::Narrow) => 500,
        Some(Filter::Wide) => 2400,
        Some(Filter::Normal) | None => 0,
    }
}

fn parse_number(line: Option<&String>) -> Result<f64, DeviceError> {
    let line = line.ok_or_else(|| DeviceError::Parse("empty reply".into()))?;
    line.trim()
        .parse()
        .map_err(|_| DeviceError::Parse(line.clone()))
}

/// Radio behind `rigctld --vfo`.
pub struct RigctldRadio {
    client: LineClient,
}

impl RigctldRadio {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            client: LineClient::new(address),
        }
    }
}

impl Radio for RigctldRadio {
    fn is_active(&mut self) -> bool {
        self.client.is_connected()
    }

    fn frequency(&mut self, vfo: Vfo) -> Result<f64, DeviceError> {
        let reply = self.client.request(&format!("f {}", vfo), 1)?;
        parse_number(reply.first())
    }

    fn set_frequency(&mut self, vfo: Vfo, hz: f64) -> Result<(), DeviceError> {
        self.client.command(&format!("F {} {:.0}", vfo, hz))
    }

    fn set_mode(&mut self, vfo: Vfo, mode: Mode, filter: Option<Filter>) -> Result<(), DeviceError> {
        self.client.command(&format!(
            "M {} {} {}",
            vfo,
            hamlib_mode(mode),
            passband_hz(filter)
        ))
    }

    fn set_split_mode(&mut self, on: bool) -> Result<(), DeviceError> {
        self.client
            .command(&format!("S currVFO {} {}", u8::from(on), Vfo::B))
    }

    fn set_satellite_mode(&mut self, on: bool) -> Result<(), DeviceError> {
        self.client
            .command(&format!("U currVFO SATMODE {}", u8::from(on)))
    }

    fn swap_vfos(&mut self) -> Result<(), DeviceError> {
        self.client.command("G currVFO XCHG")
    }
}

/// Rotor behind `rotctld`.
pub struct RotctldRotor {
    client: LineClient,
}

impl RotctldRotor {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            client: LineClient::new(address),
        }
    }
}

impl Rotor for RotctldRotor {
    fn is_active(&mut self) -> bool {
        self.client.is_connected()
    }

    fn position(&mut self) -> Result<AzEl, DeviceError> {
        let reply = self.client.request("p", 2)?;
        Ok(AzEl::new(
            parse_number(reply.first())?,
            parse_number(reply.get(1))?,
        ))
    }

    fn set_position(&mut self, target: AzEl) -> Result<(), DeviceError> {
        self.client.command(&format!(
            "P {:.1} {:.1}",
            target.azimuth_deg, target.elevation_deg
        ))
    }
}
