use fancy_regex::Regex;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

// Used as a "shadow" struct to store potentially invalid `ApiVersion` data
// when deserializing.
// <https://dev.to/equalma/validate-fields-and-types-in-serde-with-tryfrom-c2n>
#[derive(Deserialize)]
struct ApiVersionUnchecked(String);

impl TryFrom<ApiVersionUnchecked> for ApiVersion {
    type Error = ApiVersionError;

    fn try_from(value: ApiVersionUnchecked) -> Result<Self, Self::Error> {
        Self::from_str(value.0.as_str())
    }
}

/// An API version of the buildpack ↔ lifecycle contract.
///
/// This MUST be in form `<major>.<minor>` or `<major>`, where `<major>` is
/// equivalent to `<major>.0`. The same type describes both the buildpack API
/// a descriptor declares and the platform API the lifecycle runs against;
/// both gate behavior through ordered comparisons.
///
/// # Examples
/// ```
/// use lifecycle_data::api::ApiVersion;
///
/// let version = "0.5".parse::<ApiVersion>().unwrap();
/// assert!(version >= ApiVersion::new(0, 5));
/// assert!(version < ApiVersion::new(0, 6));
/// ```
#[derive(Deserialize, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "ApiVersionUnchecked")]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(?P<major>\d+)(\.(?P<minor>\d+))?$").unwrap();
        }

        if let Some(captures) = RE.captures(value).unwrap_or_default() {
            if let Some(major) = captures.name("major") {
                let major = major
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| Self::Err::InvalidApiVersion(String::from(value)))?;

                // If no minor version is specified default to 0.
                let minor = captures
                    .name("minor")
                    .map_or("0", |s| s.as_str())
                    .parse::<u32>()
                    .map_err(|_| Self::Err::InvalidApiVersion(String::from(value)))?;

                return Ok(Self { major, minor });
            }
        }

        Err(Self::Err::InvalidApiVersion(String::from(value)))
    }
}

impl Display for ApiVersion {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&format!("{}.{}", self.major, self.minor))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ApiVersionError {
    #[error("Found `{0}` but value MUST be in the form `<major>.<minor>` or `<major>` and only contain numbers.")]
    InvalidApiVersion(String),
}
