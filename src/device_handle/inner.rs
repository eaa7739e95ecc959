//! Holds private implementations of [DeviceHandle] functionality.

use std::io::Write;

use crate::frame::{self, Reply};
use crate::observer::Direction;
use crate::transport::Connector;
use crate::{Command, Error, Result};

use super::{DeviceHandle, Link};

impl<C: Connector> DeviceHandle<C> {
    /// Writes the request for `command`, and reads back the validated reply.
    ///
    /// Substantive replies are acknowledged before returning. Commands that the device
    /// never answers (ACK, NACK) return [Reply::Ack] once written.
    pub(crate) fn poll_message(&self, link: &mut Link<C>, command: Command) -> Result<Reply> {
        log::trace!("Sending command: {command}");

        let request = command.to_frame()?;
        self.send_frame(link, &request)?;

        if !command.expects_reply() {
            return Ok(Reply::Ack);
        }

        let raw = {
            let transport = Self::transport_mut(link)?;
            self.reader.read_frame(transport)?
        };
        self.observer.on_frame(Direction::Incoming, &raw);

        let reply = match frame::parse_response(&raw) {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("Failed {command} command: {err}");
                return Err(err);
            }
        };

        if reply.is_substantive() {
            self.handshake(link)?;
        }

        log::debug!("Successful {command} command");

        Ok(reply)
    }

    /// Completes an exchange by sending an ACK frame to the device.
    pub(crate) fn handshake(&self, link: &mut Link<C>) -> Result<()> {
        let ack = Command::Ack.to_frame()?;
        self.send_frame(link, &ack)
    }

    fn send_frame(&self, link: &mut Link<C>, frame: &[u8]) -> Result<()> {
        let transport = Self::transport_mut(link)?;

        self.observer.on_frame(Direction::Outgoing, frame);

        transport.write_all(frame)?;
        transport.flush()?;

        Ok(())
    }

    fn transport_mut(link: &mut Link<C>) -> Result<&mut C::Transport> {
        link.transport
            .as_mut()
            .ok_or(Error::ConnectionState("connection closed".into()))
    }
}
