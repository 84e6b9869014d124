//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the
//! software.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};
use zmq::{Context, Socket, SocketEvent};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Number of monitors that are registered. Used to provide unique IDs for each mointor endpoint.
static NUM_MONITORS: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A bound zmq PUB socket whose sends never block.
///
/// A background thread monitors the socket and keeps count of the connected subscribers.
pub struct PubSocket {
    socket: Socket,

    join_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    num_subscribers: Arc<AtomicUsize>,
}

/// Options which can be set on a [`PubSocket`].
///
/// Options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_SNDHWM`: Set high water mark for outbound messages. Messages beyond the mark are
    /// dropped by the PUB socket.
    pub send_hwm: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// Receive timeout of the monitor socket, bounds how long dropping the socket waits for the
    /// monitor thread.
    pub monitor_poll_ms: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not bind the socket to {0}: {1}")]
    CouldNotBind(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PubSocket {
    /// Create a new publisher bound to the given endpoint.
    ///
    /// ## Arguments
    /// - `ctx`: the zmq context which will be used to create the socket
    /// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
    /// - `endpoint`: a zmq endpoint string, such as `"tcp://*:5030"`
    pub fn new(
        ctx: &Context,
        socket_options: &SocketOptions,
        endpoint: &str,
    ) -> Result<Self, NetError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let num_subscribers = Arc::new(AtomicUsize::new(0));

        let socket = ctx.socket(zmq::PUB).map_err(NetError::CreateSocketError)?;

        // Enable, create, and connect monitor
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NUM_MONITORS.fetch_add(1, Ordering::Relaxed)
        );
        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(NetError::MonitoringEnableError)?;
        let monitor = ctx.socket(zmq::PAIR).map_err(NetError::CreateSocketError)?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(NetError::MonitoringEnableError)?;
        set_sockopts!(monitor, (set_rcvtimeo, socket_options.monitor_poll_ms));

        socket_options.set(&socket)?;

        socket
            .bind(endpoint)
            .map_err(|e| NetError::CouldNotBind(endpoint.into(), e))?;

        let shutdown_clone = shutdown.clone();
        let num_subscribers_clone = num_subscribers.clone();
        let join_handle = thread::spawn(move || {
            monitor_socket(monitor, monitor_endpoint, shutdown_clone, num_subscribers_clone)
        });

        Ok(Self {
            socket,
            join_handle: Some(join_handle),
            shutdown,
            num_subscribers,
        })
    }

    /// Number of subscribers currently connected.
    pub fn num_subscribers(&self) -> usize {
        self.num_subscribers.load(Ordering::Relaxed)
    }

    /// Send a message without blocking.
    ///
    /// Returns `Ok(false)` if the message was dropped because the socket could not take it.
    pub fn try_send(&self, data: &str) -> Result<bool, zmq::Error> {
        match self.socket.send(data, zmq::DONTWAIT) {
            Ok(()) => Ok(true),
            Err(zmq::Error::EAGAIN) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Drop for PubSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(jh) = self.join_handle.take() {
            jh.join().ok();
        }
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_linger, self.linger),
            (set_sndhwm, self.send_hwm),
            (set_sndtimeo, self.send_timeout)
        );

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            linger: 1,
            send_hwm: 16,
            send_timeout: 0,
            monitor_poll_ms: 100,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read an event from a monitor socket.
fn read_event(socket: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = socket.recv_msg(0)?;

    if msg.len() < 2 {
        return Err(zmq::Error::EPROTO);
    }
    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    // Each event is followed by the address, which isn't needed
    if socket.get_rcvmore()? {
        let _ = socket.recv_msg(0)?;
    }

    Ok(SocketEvent::from_raw(event))
}

fn monitor_socket(
    monitor: Socket,
    monitor_endpoint: String,
    shutdown: Arc<AtomicBool>,
    num_subscribers: Arc<AtomicUsize>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let event = match read_event(&monitor) {
            Ok(e) => e,
            // Receive timeout, go round and check the shutdown flag
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                warn!("Error reading event from monitor {}: {}", monitor_endpoint, e);
                break;
            }
        };

        match event {
            SocketEvent::ACCEPTED => {
                let n = num_subscribers.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Subscriber connected ({} total)", n);
            }
            SocketEvent::DISCONNECTED => {
                let n = num_subscribers.load(Ordering::Relaxed).saturating_sub(1);
                num_subscribers.store(n, Ordering::Relaxed);
                debug!("Subscriber disconnected ({} total)", n);
            }
            _ => (),
        }
    }
}
