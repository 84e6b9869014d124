//! # Dashboard Server
//!
//! Publishes telemetry to the operator dashboard as JSON [`DashFrame`]s over a zmq PUB socket.
//!
//! Values pushed between two flushes are coalesced, only the latest value of each channel is sent.
//! Sends never block. If the socket cannot take a frame it is dropped and counted, keyframes make
//! the lost values visible again.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::Utc;
use log::{debug, warn};

use comms_if::{
    dash::{
        ChannelAnnouncement, ChannelId, ChannelSpec, ChannelUpdate, ChannelValue, DashFrame,
        DashTransport, TransportError,
    },
    net::{zmq, NetError, PubSocket, SocketOptions},
};

use crate::params::SwerveExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Buffers announcements and values between flushes and builds the frames to send.
#[derive(Debug, Default)]
pub struct DashBuffer {
    announcements: Vec<ChannelAnnouncement>,

    /// Latest unsent value of each channel, indexed by channel ID.
    pending: Vec<Option<ChannelValue>>,

    /// IDs with a pending value, in the order they were first pushed.
    dirty: Vec<ChannelId>,

    /// Reused between frames.
    updates: Vec<ChannelUpdate>,
}

/// Dashboard server
pub struct DashServer {
    socket: PubSocket,

    buffer: DashBuffer,

    num_sent: u64,

    num_dropped: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DashServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DashBuffer {
    /// Record a new channel.
    pub fn announce(&mut self, id: ChannelId, spec: &ChannelSpec) {
        let idx = id.0 as usize;
        if self.pending.len() <= idx {
            self.pending.resize(idx + 1, None);
        }

        self.announcements.push(ChannelAnnouncement {
            id,
            spec: spec.clone(),
        });
    }

    /// Buffer a value, replacing any unsent value of the same channel.
    pub fn push(&mut self, id: ChannelId, value: &ChannelValue) -> Result<(), TransportError> {
        let slot = self
            .pending
            .get_mut(id.0 as usize)
            .ok_or(TransportError::UnknownChannel(id))?;

        if slot.is_none() {
            self.dirty.push(id);
        }
        *slot = Some(*value);

        Ok(())
    }

    /// Number of channels with an unsent value.
    pub fn num_pending(&self) -> usize {
        self.dirty.len()
    }

    /// The layout frame, listing every announced channel.
    pub fn layout_frame(&self) -> DashFrame {
        DashFrame::Layout {
            channels: self.announcements.clone(),
        }
    }

    /// Take the pending values as a frame.
    ///
    /// Returns `None` if there is nothing to send and this is not a keyframe.
    pub fn take_values_frame(&mut self, keyframe: bool) -> Option<DashFrame> {
        if self.dirty.is_empty() && !keyframe {
            return None;
        }

        let mut updates = std::mem::take(&mut self.updates);
        updates.clear();

        for id in self.dirty.drain(..) {
            if let Some(value) = self.pending[id.0 as usize].take() {
                updates.push(ChannelUpdate { id, value });
            }
        }

        Some(DashFrame::Values {
            timestamp: Utc::now(),
            keyframe,
            values: updates,
        })
    }

    /// Give a sent frame's buffer back for reuse.
    pub fn recycle(&mut self, frame: DashFrame) {
        if let DashFrame::Values { values, .. } = frame {
            self.updates = values;
        }
    }
}

impl DashServer {
    /// Create a new instance of the dashboard server.
    ///
    /// This function will not block until a dashboard connects.
    pub fn new(ctx: &zmq::Context, params: &SwerveExecParams) -> Result<Self, DashServerError> {
        let socket_options = SocketOptions {
            send_hwm: params.dash_send_hwm,
            ..Default::default()
        };

        let socket = PubSocket::new(ctx, &socket_options, &params.dash_endpoint)
            .map_err(DashServerError::SocketError)?;

        Ok(Self {
            socket,
            buffer: DashBuffer::default(),
            num_sent: 0,
            num_dropped: 0,
        })
    }

    /// Number of dashboards currently connected.
    pub fn num_subscribers(&self) -> usize {
        self.socket.num_subscribers()
    }

    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }

    /// Number of frames dropped because the socket was full.
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped
    }

    fn send(&mut self, frame: &DashFrame) -> Result<(), TransportError> {
        let json = serde_json::to_string(frame).map_err(TransportError::SerializationError)?;

        if self.socket.try_send(&json).map_err(TransportError::SendError)? {
            self.num_sent += 1;
        } else {
            self.num_dropped += 1;
            debug!("Dashboard frame dropped ({} total)", self.num_dropped);
        }

        Ok(())
    }
}

impl DashTransport for DashServer {
    fn announce(&mut self, id: ChannelId, spec: &ChannelSpec) {
        self.buffer.announce(id, spec);
    }

    fn push(&mut self, id: ChannelId, value: &ChannelValue) {
        if let Err(e) = self.buffer.push(id, value) {
            warn!("Dashboard server rejected a value: {}", e);
        }
    }

    fn flush(&mut self, keyframe: bool) -> Result<(), TransportError> {
        if keyframe {
            let layout = self.buffer.layout_frame();
            self.send(&layout)?;
        }

        match self.buffer.take_values_frame(keyframe) {
            Some(frame) => {
                let result = self.send(&frame);
                self.buffer.recycle(frame);
                result
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::dash::{ChannelKind, Group, Tab};

    fn buffer_with(n: u32) -> DashBuffer {
        let mut buffer = DashBuffer::default();
        for i in 0..n {
            buffer.announce(
                ChannelId(i),
                &ChannelSpec::new(Group::tab(Tab::Power), format!("C{}", i), ChannelKind::Scalar),
            );
        }
        buffer
    }

    #[test]
    fn test_values_coalesced() {
        let mut buffer = buffer_with(3);

        buffer.push(ChannelId(2), &ChannelValue::Number(1.0)).unwrap();
        buffer.push(ChannelId(0), &ChannelValue::Number(5.0)).unwrap();
        buffer.push(ChannelId(2), &ChannelValue::Number(3.0)).unwrap();
        assert_eq!(buffer.num_pending(), 2);

        match buffer.take_values_frame(false) {
            Some(DashFrame::Values {
                keyframe, values, ..
            }) => {
                assert!(!keyframe);
                assert_eq!(
                    values,
                    vec![
                        ChannelUpdate {
                            id: ChannelId(2),
                            value: ChannelValue::Number(3.0)
                        },
                        ChannelUpdate {
                            id: ChannelId(0),
                            value: ChannelValue::Number(5.0)
                        },
                    ]
                );
            }
            f => panic!("Unexpected frame {:?}", f),
        }

        assert_eq!(buffer.num_pending(), 0);
        assert!(buffer.take_values_frame(false).is_none());
        assert!(buffer.take_values_frame(true).is_some());
    }

    #[test]
    fn test_unknown_channel() {
        let mut buffer = buffer_with(1);

        assert!(matches!(
            buffer.push(ChannelId(4), &ChannelValue::Number(1.0)),
            Err(TransportError::UnknownChannel(ChannelId(4)))
        ));
    }

    #[test]
    fn test_layout_frame() {
        let buffer = buffer_with(2);

        match buffer.layout_frame() {
            DashFrame::Layout { channels } => {
                assert_eq!(channels.len(), 2);
                assert_eq!(channels[1].spec.name, "C1");
            }
            f => panic!("Unexpected frame {:?}", f),
        }
    }
}
