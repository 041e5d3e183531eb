//! Deployment configuration consumed as opaque strings.

use core::fmt;

use crate::telemetry::frame::FrameSchema;

/// How readings reach the device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transport {
    /// Subscribe to a broker topic carrying delimited messages.
    Mqtt,
    /// Periodically fetch and scrape an HTML status page.
    HttpPoll,
}

impl Transport {
    /// Parses the build-time selector; anything but `http` means MQTT.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            Some(value) if value.eq_ignore_ascii_case("http") => Self::HttpPoll,
            _ => Self::Mqtt,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    pub ssid: &'static str,
    pub passphrase: &'static str,
    /// Broker host (`host[:port]`) or status page URL.
    pub endpoint: &'static str,
    pub topic: &'static str,
    pub title: &'static str,
    pub transport: Transport,
    pub schema: FrameSchema,
}

impl DeviceConfig {
    pub const fn new(ssid: &'static str, passphrase: &'static str, endpoint: &'static str) -> Self {
        Self {
            ssid,
            passphrase,
            endpoint,
            topic: "",
            title: "",
            transport: Transport::Mqtt,
            schema: FrameSchema::Full,
        }
    }

    pub const fn with_topic(mut self, topic: &'static str) -> Self {
        self.topic = topic;
        self
    }

    pub const fn with_title(mut self, title: &'static str) -> Self {
        self.title = title;
        self
    }

    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub const fn with_schema(mut self, schema: FrameSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Checks the settings the firmware cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.trim().is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.transport == Transport::Mqtt && self.topic.trim().is_empty() {
            return Err(ConfigError::MissingTopic);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
    MissingSsid,
    MissingEndpoint,
    MissingTopic,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSsid => f.write_str("wifi ssid is empty"),
            Self::MissingEndpoint => f.write_str("telemetry endpoint is empty"),
            Self::MissingTopic => f.write_str("mqtt topic is empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mqtt_requires_topic() {
        let config = DeviceConfig::new("home", "secret", "broker.lan");
        assert_eq!(config.validate(), Err(ConfigError::MissingTopic));
        assert_eq!(config.with_topic("energy/summary").validate(), Ok(()));
    }

    #[test]
    fn http_poll_does_not_need_topic() {
        let config = DeviceConfig::new("home", "", "http://boiler.lan/status")
            .with_transport(Transport::from_selector(Some("HTTP")));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn blank_ssid_is_rejected() {
        let config = DeviceConfig::new("  ", "x", "broker").with_topic("t");
        assert_eq!(config.validate(), Err(ConfigError::MissingSsid));
    }
}
