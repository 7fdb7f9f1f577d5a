//! Publish/subscribe sink
//!
//! Publishes one message per decoded record as a UDP datagram of
//! `topic + NUL + JSON-body`. The NUL-separated topic prefix lets
//! subscribers match on topic prefixes without parsing the JSON body. The
//! bus transport beyond this datagram shape is an external collaborator.

use std::net::{SocketAddr, UdpSocket};

use crate::error::Result;
use crate::sink::{Envelope, Sink};

/// Frame a pub/sub message: topic bytes, NUL separator, JSON body
pub fn frame_message(topic: &str, body: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(topic.len() + 1 + body.len());
    message.extend_from_slice(topic.as_bytes());
    message.push(0);
    message.extend_from_slice(body.as_bytes());
    message
}

/// UDP datagram publisher
pub struct UdpPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpPublisher {
    /// Bind an ephemeral local socket aimed at the bus endpoint
    pub fn new(target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        Ok(Self { socket, target })
    }

    /// Publish one framed message
    pub fn publish(&self, topic: &str, body: &str) -> Result<()> {
        self.socket
            .send_to(&frame_message(topic, body), self.target)?;
        Ok(())
    }
}

impl Sink for UdpPublisher {
    fn name(&self) -> &'static str {
        "pubsub"
    }

    fn write(&mut self, envelope: &Envelope) -> Result<()> {
        self.publish(&envelope.topic, &envelope.to_line())
    }
}
