//! Program identity announced in activation requests.
//!
//! The gateway identifies a node's firmware by the program name and version
//! encoded in the firmware file name, e.g. `C:\build\door_sensor_3.bin`.

#![deny(unsafe_code)]

use core::fmt::Write;

use heapless::String;

use crate::error::Error;

/// Longest program name accepted by the gateway.
pub const MAX_PROGRAM_NAME_LEN: usize = 11;

/// Capacity of the activation request.
pub const ACTIVATION_REQUEST_LEN: usize = 50;

/// Prefix of the activation request.
const REQUEST_PREFIX: &str = "factory-iot";

/// Name and version of the running program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramIdentity {
    name: String<MAX_PROGRAM_NAME_LEN>,
    version: u8,
}

impl ProgramIdentity {
    /// Creates an identity from its parts.
    pub fn new(name: &str, version: u8) -> Result<Self, Error> {
        let name = String::try_from(name).map_err(|_| Error::InvalidProgramName)?;
        Ok(Self { name, version })
    }

    /// Extracts the identity from a firmware path.
    ///
    /// The last `\`-separated component is used; everything from its first
    /// `.` is dropped, the part before the last `_` is the name and the part
    /// after it the version. A missing or malformed version reads as 0.
    ///
    /// Legacy firmware split at the *first* `_`, so `door_sens_12` announced
    /// itself as `door` with version 0. Here it is `door_sens` version 12;
    /// names without an inner `_` read the same under both rules.
    ///
    /// ```rust
    /// use subghz_iot::identity::ProgramIdentity;
    ///
    /// let id = ProgramIdentity::from_path(r"C:\build\door_3.bin").unwrap();
    /// assert_eq!(id.name(), "door");
    /// assert_eq!(id.version(), 3);
    /// assert_eq!(id.activation_request().unwrap().as_str(), "factory-iot,door,3");
    /// ```
    pub fn from_path(path: &str) -> Result<Self, Error> {
        let file = path.rsplit('\\').next().unwrap_or(path);
        let stem = file.split('.').next().unwrap_or(file);
        let (name, version) = match stem.rsplit_once('_') {
            Some((name, version)) => (name, version.parse::<u8>().unwrap_or(0)),
            None => (stem, 0),
        };
        if name.is_empty() {
            return Err(Error::InvalidProgramName);
        }
        Self::new(name, version)
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Renders `factory-iot,<name>,<version>`.
    pub fn activation_request(&self) -> Result<String<ACTIVATION_REQUEST_LEN>, Error> {
        let mut request = String::new();
        write!(request, "{},{},{}", REQUEST_PREFIX, self.name, self.version)
            .map_err(|_| Error::BufferOverflow)?;
        Ok(request)
    }
}
