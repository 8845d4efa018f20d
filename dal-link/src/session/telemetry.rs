//! Outbound UDP telemetry.

use crate::error::Result;
use crate::wire::{ImageDatagram, PoseDatagram};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Fire-and-forget sender for pose and image datagrams.
pub struct TelemetrySink {
    socket: UdpSocket,
    pose_target: SocketAddr,
    image_target: SocketAddr,
    max_image_datagram: usize,
    /// Reused between pose datagrams
    send_buffer: Vec<u8>,
}

impl TelemetrySink {
    /// Bind an ephemeral local socket aimed at the given observers.
    pub fn new<A: ToSocketAddrs, B: ToSocketAddrs>(
        pose_target: A,
        image_target: B,
        max_image_datagram: usize,
    ) -> Result<Self> {
        let pose_target = resolve(pose_target)?;
        let image_target = resolve(image_target)?;
        let bind_addr = if pose_target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;

        log::info!(
            "Telemetry to {} (pose+range), {} (image)",
            pose_target,
            image_target
        );

        Ok(Self {
            socket,
            pose_target,
            image_target,
            max_image_datagram,
            send_buffer: Vec::with_capacity(PoseDatagram::HEADER_LEN + 360 * 4),
        })
    }

    /// Send a pose+range datagram
    pub fn send_pose(&mut self, dgram: &PoseDatagram) -> Result<()> {
        dgram.encode_into(&mut self.send_buffer)?;
        self.socket.send_to(&self.send_buffer, self.pose_target)?;
        log::trace!(
            "Sent pose ({} beams) to {}",
            dgram.ranges.len(),
            self.pose_target
        );
        Ok(())
    }

    /// Send an image; frames above the ceiling fail with `Oversize`.
    pub fn send_image(&mut self, dgram: &ImageDatagram) -> Result<()> {
        let buf = dgram.encode(self.max_image_datagram)?;
        self.socket.send_to(&buf, self.image_target)?;
        log::trace!(
            "Sent {}x{} image to {}",
            dgram.frame.width,
            dgram.frame.height,
            self.image_target
        );
        Ok(())
    }
}

fn resolve<A: ToSocketAddrs>(addr: A) -> Result<SocketAddr> {
    addr.to_socket_addrs()?.next().ok_or_else(|| {
        crate::error::Error::InvalidParameter("address resolved to nothing".to_string())
    })
}
