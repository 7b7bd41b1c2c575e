use std::{fmt::Display, str::FromStr, time::Duration};

/// The CARD4L optical schema, pinned to a specific commit.
pub const CARD4L_OPTICAL: &str = "https://raw.githubusercontent.com/stac-extensions/card4l/4e62c51a8fc40cce7f0a6dd7dbc6f2c33ff1b704/optical/json-schema/schema.json";

/// The CARD4L synthetic aperture radar schema.
pub const CARD4L_SAR: &str = "https://stac-extensions.github.io/card4l/v0.1.0/sar/schema.json";

/// Extensions that CARD4L optical products are expected to implement.
pub const OPTICAL_EXTENSIONS: [&str; 4] = [
    "https://stac-extensions.github.io/eo/v1.0.0/schema.json",
    "https://stac-extensions.github.io/projection/v1.0.0/schema.json",
    "https://stac-extensions.github.io/raster/v1.1.0/schema.json",
    "https://stac-extensions.github.io/view/v1.0.0/schema.json",
];

/// The default timeout for fetching a single schema.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A CARD4L product family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    /// Optical surface reflectance and surface temperature.
    #[default]
    Optical,

    /// Synthetic aperture radar backscatter.
    Sar,
}

/// Validation configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The CARD4L schema that every document must satisfy.
    pub card4l: String,

    /// Extensions that must be declared (and satisfied) in addition to the
    /// ones the document declares.
    pub required_extensions: Vec<String>,

    /// How long to wait for any one schema fetch.
    pub timeout: Duration,
}

impl Profile {
    /// Returns this profile's CARD4L schema url.
    pub fn schema_url(&self) -> &'static str {
        match self {
            Profile::Optical => CARD4L_OPTICAL,
            Profile::Sar => CARD4L_SAR,
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Optical => f.write_str("optical"),
            Profile::Sar => f.write_str("sar"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Profile, String> {
        match s.to_ascii_lowercase().as_str() {
            "optical" => Ok(Profile::Optical),
            "sar" | "radar" => Ok(Profile::Sar),
            _ => Err(format!("unknown card4l profile: {s}")),
        }
    }
}

impl Config {
    /// Creates a configuration for a CARD4L profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{CARD4L_SAR, Config, Profile};
    ///
    /// let config = Config::new(Profile::Sar);
    /// assert_eq!(config.card4l, CARD4L_SAR);
    /// ```
    pub fn new(profile: Profile) -> Config {
        Config {
            card4l: profile.schema_url().to_string(),
            required_extensions: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Uses a different CARD4L schema url.
    pub fn with_card4l(mut self, url: impl ToString) -> Config {
        self.card4l = url.to_string();
        self
    }

    /// Requires an extension.
    pub fn with_required_extension(mut self, url: impl ToString) -> Config {
        self.required_extensions.push(url.to_string());
        self
    }

    /// Requires the eo, projection, raster, and view extensions.
    pub fn with_optical_extensions(self) -> Config {
        OPTICAL_EXTENSIONS
            .into_iter()
            .fold(self, |config, url| config.with_required_extension(url))
    }

    /// Sets the fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Config {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new(Profile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{CARD4L_OPTICAL, Config, OPTICAL_EXTENSIONS, Profile};

    #[test]
    fn default_is_optical() {
        let config = Config::default();
        assert_eq!(config.card4l, CARD4L_OPTICAL);
        assert!(config.required_extensions.is_empty());
    }

    #[test]
    fn parse_profile() {
        assert_eq!("optical".parse::<Profile>().unwrap(), Profile::Optical);
        assert_eq!("SAR".parse::<Profile>().unwrap(), Profile::Sar);
        let _ = "lidar".parse::<Profile>().unwrap_err();
    }

    #[test]
    fn optical_extensions() {
        let config = Config::default().with_optical_extensions();
        assert_eq!(config.required_extensions, OPTICAL_EXTENSIONS);
    }
}
