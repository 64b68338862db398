use std::time::Duration;

use sonyptp_transport::Endpoints;
use sonyptp_wire::{ContainerConfig, DEFAULT_STAGING_SIZE};

/// Default number of pre-submitted interrupt reads.
pub const DEFAULT_EVENT_SLOTS: usize = 10;

/// Configuration for a PTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session id sent with OpenSession.
    pub session_id: u32,
    /// USB interface claimed for the session.
    pub interface: u8,
    /// Endpoint addresses.
    pub endpoints: Endpoints,
    /// First-read staging buffer for inbound data.
    pub staging_size: usize,
    /// Timeout for every bulk IN read. Bulk OUT writes never time out.
    pub response_timeout: Duration,
    /// Interrupt reads kept in flight while a callback is registered.
    pub event_slots: usize,
    /// How long one pump of the host event loop may block.
    pub event_poll: Duration,
    /// Upper bound on waiting for cancelled event transfers at close.
    pub cancel_timeout: Duration,
    /// Zero-length reads skipped before one counts.
    pub zero_length_retries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: 1,
            interface: 0,
            endpoints: Endpoints::default(),
            staging_size: DEFAULT_STAGING_SIZE,
            response_timeout: Duration::from_secs(5),
            event_slots: DEFAULT_EVENT_SLOTS,
            event_poll: Duration::from_millis(100),
            cancel_timeout: Duration::from_secs(5),
            zero_length_retries: 16,
        }
    }
}

impl SessionConfig {
    pub fn with_session_id(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_interface(mut self, interface: u8) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_staging_size(mut self, staging_size: usize) -> Self {
        self.staging_size = staging_size;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_event_slots(mut self, slots: usize) -> Self {
        self.event_slots = slots;
        self
    }

    pub fn with_event_poll(mut self, poll: Duration) -> Self {
        self.event_poll = poll;
        self
    }

    pub fn with_cancel_timeout(mut self, timeout: Duration) -> Self {
        self.cancel_timeout = timeout;
        self
    }

    /// Container reader/writer settings derived from this config.
    pub fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            endpoints: self.endpoints,
            staging_size: self.staging_size,
            read_timeout: Some(self.response_timeout),
            zero_length_retries: self.zero_length_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_expectations() {
        let config = SessionConfig::default();
        assert_eq!(config.session_id, 1);
        assert_eq!(config.interface, 0);
        assert_eq!(config.staging_size, 512);
        assert_eq!(config.event_slots, 10);
        assert_eq!(config.endpoints.bulk_out, 0x02);
        assert_eq!(config.endpoints.bulk_in, 0x81);
        assert_eq!(config.endpoints.interrupt_in, 0x83);
    }

    #[test]
    fn container_config_carries_read_timeout() {
        let config = SessionConfig::default().with_response_timeout(Duration::from_millis(250));
        let container = config.container_config();
        assert_eq!(container.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(container.staging_size, 512);
    }
}
