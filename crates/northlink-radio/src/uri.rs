use std::fmt;
use std::str::FromStr;

use crate::error::{RadioError, Result};
use crate::pipe::{Bandwidth, Pipe};

/// Radio pipe locator: `radio:/<index>/<channel>/<bandwidth>/<address>`.
///
/// `bandwidth` is either the dongle speed code (0, 1, 2) or a rate in kbps
/// (250, 1000, 2000).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioUri {
    /// Which dongle on the host.
    pub index: u8,
    /// Logical radio channel.
    pub channel: u8,
    /// Air data rate.
    pub bandwidth: Bandwidth,
    /// Radio address.
    pub address: String,
}

impl RadioUri {
    /// Locator the vehicle firmware listens on by default.
    pub const DEFAULT: &'static str = "radio:/0/76/2/E7E7E7E301";

    /// Build an unsubscribed pipe for this locator.
    pub fn pipe(&self) -> Pipe {
        Pipe::new(self.channel, self.bandwidth, self.address.clone())
    }
}

impl Default for RadioUri {
    fn default() -> Self {
        Self {
            index: 0,
            channel: 76,
            bandwidth: Bandwidth::Kbps2000,
            address: Pipe::DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl FromStr for RadioUri {
    type Err = RadioError;

    fn from_str(uri: &str) -> Result<Self> {
        let invalid = |reason: &str| RadioError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let rest = uri
            .strip_prefix("radio:")
            .ok_or_else(|| invalid("expected 'radio:' scheme"))?
            .trim_start_matches('/');
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != 4 {
            return Err(invalid("expected index/channel/bandwidth/address"));
        }

        let index = parts[0]
            .parse::<u8>()
            .map_err(|_| invalid("index is not a number"))?;
        let channel = parts[1]
            .parse::<u8>()
            .map_err(|_| invalid("channel is not a number"))?;
        let rate = parts[2]
            .parse::<u32>()
            .map_err(|_| invalid("bandwidth is not a number"))?;
        let bandwidth = match u8::try_from(rate).ok().and_then(Bandwidth::from_speed_code) {
            Some(bandwidth) => bandwidth,
            None => Bandwidth::try_from(rate)?,
        };
        let address = parts[3];
        if address.is_empty() {
            return Err(invalid("address is empty"));
        }

        Ok(Self {
            index,
            channel,
            bandwidth,
            address: address.to_string(),
        })
    }
}

impl fmt::Display for RadioUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "radio:/{}/{}/{}/{}",
            self.index,
            self.channel,
            self.bandwidth.speed_code(),
            self.address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_uri() {
        let uri: RadioUri = RadioUri::DEFAULT.parse().unwrap();
        assert_eq!(uri, RadioUri::default());
        assert_eq!(uri.to_string(), RadioUri::DEFAULT);
    }

    #[test]
    fn accepts_kbps_and_double_slash() {
        let uri: RadioUri = "radio://1/40/250/300".parse().unwrap();
        assert_eq!(uri.index, 1);
        assert_eq!(uri.channel, 40);
        assert_eq!(uri.bandwidth, Bandwidth::Kbps250);
        assert_eq!(uri.address, "300");

        let pipe = uri.pipe();
        assert_eq!(pipe.channel(), 40);
        assert_eq!(pipe.address(), "300");
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(matches!(
            "serial:/0/76/2/E7".parse::<RadioUri>(),
            Err(RadioError::InvalidUri { .. })
        ));
        assert!(matches!(
            "radio:/0/76/2".parse::<RadioUri>(),
            Err(RadioError::InvalidUri { .. })
        ));
        assert!(matches!(
            "radio:/0/76/500/E7".parse::<RadioUri>(),
            Err(RadioError::InvalidBandwidth(500))
        ));
        assert!(matches!(
            "radio:/0/300/2/E7".parse::<RadioUri>(),
            Err(RadioError::InvalidUri { .. })
        ));
    }
}
