//! Serial connection configuration.

use std::{env, fmt, time};

use crate::reader::MAX_READ_ATTEMPTS;
use crate::{Error, Result};

/// Default serial device path.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Default serial BAUD rate.
pub const BAUD_RATE: u32 = Baud::B9600 as u32;
/// Timeout for a single serial read (milliseconds).
pub const SERIAL_TIMEOUT_MS: u64 = 5_000;

/// Environment variable overriding the serial device path.
pub const ENV_PORT: &str = "CC_VALIDATOR_PORT";
/// Environment variable overriding the BAUD rate.
pub const ENV_BAUD: &str = "CC_VALIDATOR_BAUD";
/// Environment variable overriding the per-read timeout (milliseconds).
pub const ENV_TIMEOUT_MS: &str = "CC_VALIDATOR_TIMEOUT_MS";
/// Environment variable overriding the read attempt budget.
pub const ENV_READ_ATTEMPTS: &str = "CC_VALIDATOR_READ_ATTEMPTS";

/// Serial BAUD rates supported by the validator.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Baud {
    #[default]
    B9600 = 9_600,
    B19200 = 19_200,
}

impl From<Baud> for u32 {
    fn from(val: Baud) -> Self {
        val as u32
    }
}

impl TryFrom<u32> for Baud {
    type Error = Error;

    fn try_from(val: u32) -> Result<Self> {
        match val {
            9_600 => Ok(Self::B9600),
            19_200 => Ok(Self::B19200),
            _ => Err(Error::Config(format!("unsupported BAUD rate: {val}"))),
        }
    }
}

impl fmt::Display for Baud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

/// Connection parameters for a validator on a serial port.
///
/// ```
/// use cc_validator::{Baud, SerialConfig};
///
/// let config = SerialConfig::new("/dev/ttyS1")
///     .with_baud(Baud::B19200)
///     .with_read_attempts(50);
///
/// assert_eq!(config.baud(), Baud::B19200);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    path: String,
    baud: Baud,
    timeout: time::Duration,
    read_attempts: usize,
    response_timeout: Option<time::Duration>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

impl SerialConfig {
    /// Creates a new [SerialConfig] for `path` with default parameters.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.into(),
            baud: Baud::default(),
            timeout: time::Duration::from_millis(SERIAL_TIMEOUT_MS),
            read_attempts: MAX_READ_ATTEMPTS,
            response_timeout: None,
        }
    }

    /// Creates a [SerialConfig] from the `CC_VALIDATOR_*` environment variables.
    ///
    /// Unset variables keep their defaults, unparseable ones are an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(env::var(ENV_PORT).as_deref().unwrap_or(DEFAULT_PORT));

        if let Some(baud) = parse_env::<u32>(ENV_BAUD)? {
            config.baud = Baud::try_from(baud)?;
        }

        if let Some(ms) = parse_env::<u64>(ENV_TIMEOUT_MS)? {
            config.timeout = time::Duration::from_millis(ms);
        }

        if let Some(attempts) = parse_env::<usize>(ENV_READ_ATTEMPTS)? {
            config = config.with_read_attempts(attempts);
        }

        config.validate()?;

        Ok(config)
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    pub const fn baud(&self) -> Baud {
        self.baud
    }

    pub fn with_baud(mut self, baud: Baud) -> Self {
        self.baud = baud;
        self
    }

    /// Timeout for a single transport read.
    pub const fn timeout(&self) -> time::Duration {
        self.timeout
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum number of transport reads for one response frame.
    pub const fn read_attempts(&self) -> usize {
        self.read_attempts
    }

    pub fn with_read_attempts(mut self, read_attempts: usize) -> Self {
        self.read_attempts = read_attempts;
        self
    }

    /// Optional wall-clock limit for one response frame.
    pub const fn response_timeout(&self) -> Option<time::Duration> {
        self.response_timeout
    }

    pub fn with_response_timeout(mut self, timeout: time::Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Checks the configuration for values that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            Err(Error::Config("empty serial path".into()))
        } else if self.read_attempts == 0 {
            Err(Error::Config("read attempts must be non-zero".into()))
        } else if self.timeout.is_zero() {
            Err(Error::Config("serial timeout must be non-zero".into()))
        } else {
            Ok(())
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| Error::Config(format!("{key}={val}: {err}"))),
        Err(_) => Ok(None),
    }
}
