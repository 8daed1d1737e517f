// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of daq-log.
//
// daq-log is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// daq-log is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with daq-log.  If not,
// see <http://www.gnu.org/licenses/>.

//! Adapter configuration.
//!
//! Everything an adapter needs to know: where the collector lives & the least severe event worth
//! sending. Where the values come from (a command line, a properties file, the environment) is the
//! application's business.
//!
//! ```rust
//! use daq_log::config::Config;
//! use daq_log::level::Severity;
//!
//! let cfg = Config::builder()
//!     .host("expcont.example.org")
//!     .port(5514)
//!     .min_severity_as_str("warn")
//!     .unwrap()
//!     .build();
//! assert_eq!(cfg.min_severity(), Severity::Warn);
//! ```

use crate::{error::Result, level::Severity};

/// The port on which collectors conventionally listen.
pub const DEFAULT_PORT: u16 = 6666;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    host: String,
    port: u16,
    min_severity: Severity,
}

impl std::default::Default for Config {
    /// `localhost`:[`DEFAULT_PORT`], letting through [`Severity::Info`] & above
    fn default() -> Self {
        Config {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            min_severity: Severity::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            imp: Config::default(),
        }
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
}

pub struct ConfigBuilder {
    imp: Config,
}

impl ConfigBuilder {
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.imp.host = host.into();
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.imp.port = port;
        self
    }
    pub fn min_severity(mut self, min_severity: Severity) -> Self {
        self.imp.min_severity = min_severity;
        self
    }
    /// Set the minimum severity by name; unlike the lenient mapping applied to incoming events, an
    /// unknown name here is an error.
    pub fn min_severity_as_str(mut self, name: &str) -> Result<Self> {
        self.imp.min_severity = name.parse()?;
        Ok(self)
    }
    pub fn build(self) -> Config {
        self.imp
    }
}
