//! Network sector source.
//!
//! Talks to a sector server over a single TCP connection. Every message
//! is a big-endian `u32` body length, a one-byte opcode, the body, and
//! a single terminating zero byte delimiting the message on the wire.
//! The server always serves bare 2048-byte sectors and performs any
//! drive decryption on its side.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use super::{SectorFormat, SectorGeometry, SectorSource};
use crate::{SacdError, SacdResult, SACD_LSN_SIZE};

/// Request opcodes
const DISC_OPEN: u8 = 1;
const DISC_SIZE: u8 = 3;
const DISC_READ: u8 = 5;
const DISC_CLOSE: u8 = 7;

/// Response opcodes
const DISC_OPENED: u8 = 2;
const DISC_SIZED: u8 = 4;
const DISC_DATA: u8 = 6;
const DISC_ERROR: u8 = 255;

fn protocol_error(desc: &str) -> SacdError {
    SacdError::Io(io::Error::new(io::ErrorKind::InvalidData, desc.to_string()))
}

/// Sector source backed by a remote sector server
pub struct NetSource {
    /// Connection to the server, `None` once closed
    stream: Option<TcpStream>,
    total_sectors: u32,
}

impl NetSource {
    /// Connect to `addr` (a `host:port` pair), open the remote disc and
    /// fetch its size
    pub fn connect(addr: &str) -> SacdResult<NetSource> {
        let stream = TcpStream::connect(addr)?;

        let mut source = NetSource {
            stream: Some(stream),
            total_sectors: 0,
        };

        let (opcode, _) = source.request(DISC_OPEN, &[])?;
        if opcode != DISC_OPENED {
            return Err(protocol_error("disc open refused"));
        }

        let (opcode, body) = source.request(DISC_SIZE, &[])?;
        if opcode != DISC_SIZED || body.len() != 4 {
            return Err(protocol_error("bad disc size response"));
        }

        source.total_sectors = u32::from_be_bytes(*array_ref![body, 0, 4]);

        debug!("connected to {}, {} sectors", addr, source.total_sectors);

        Ok(source)
    }

    /// Send one request and receive its response
    fn request(&mut self, opcode: u8, body: &[u8]) -> SacdResult<(u8, Vec<u8>)> {
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return Err(SacdError::Uninitialised),
        };

        let mut msg = Vec::with_capacity(body.len() + 6);

        msg.extend_from_slice(&(body.len() as u32).to_be_bytes());
        msg.push(opcode);
        msg.extend_from_slice(body);
        msg.push(0);

        stream.write_all(&msg)?;

        let mut head = [0u8; 5];
        stream.read_exact(&mut head)?;

        let len = u32::from_be_bytes(*array_ref![head, 0, 4]) as usize;
        let response = head[4];

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body)?;

        let mut terminator = [0u8; 1];
        stream.read_exact(&mut terminator)?;
        if terminator[0] != 0 {
            return Err(protocol_error("missing message terminator"));
        }

        if response == DISC_ERROR {
            return Err(protocol_error("server reported an error"));
        }

        Ok((response, body))
    }
}

impl SectorSource for NetSource {
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32> {
        if buf.len() < count as usize * SACD_LSN_SIZE {
            return Err(SacdError::InvalidArgument);
        }

        if lsn >= self.total_sectors {
            return Err(SacdError::NoData);
        }

        let count = count.min(self.total_sectors - lsn);

        let mut body = [0u8; 8];
        body[0..4].copy_from_slice(&lsn.to_be_bytes());
        body[4..8].copy_from_slice(&count.to_be_bytes());

        let (opcode, data) = self.request(DISC_READ, &body)?;

        if opcode != DISC_DATA || data.len() != count as usize * SACD_LSN_SIZE {
            // The server must return every requested sector, short
            // reads are errors
            return Err(protocol_error("short sector read"));
        }

        buf[..data.len()].copy_from_slice(&data);

        Ok(count)
    }

    fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    fn geometry(&self) -> SectorGeometry {
        SectorFormat::Plain2048.geometry()
    }

    fn close(&mut self) -> SacdResult<()> {
        if self.stream.is_some() {
            // Best effort, the connection is going away regardless
            let _ = self.request(DISC_CLOSE, &[]);

            self.stream = None;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::spawn_sector_server;

    /// Serve sectors whose first byte is their own sector number
    fn spawn_server(sectors: u32) -> String {
        let mut data = vec![0u8; sectors as usize * SACD_LSN_SIZE];

        for s in 0..sectors as usize {
            data[s * SACD_LSN_SIZE] = s as u8;
        }

        spawn_sector_server(data)
    }

    #[test]
    fn open_and_read() {
        let addr = spawn_server(600);

        let mut source = NetSource::connect(&addr).unwrap();

        assert_eq!(source.total_sectors(), 600);
        assert_eq!(source.geometry().format, SectorFormat::Plain2048);

        let mut buf = vec![0u8; 3 * SACD_LSN_SIZE];
        assert_eq!(source.read_sectors(100, 3, &mut buf).unwrap(), 3);
        assert_eq!(buf[0], 100);
        assert_eq!(buf[SACD_LSN_SIZE], 101);
        assert_eq!(buf[2 * SACD_LSN_SIZE], 102);

        assert!(matches!(
            source.read_sectors(600, 1, &mut buf),
            Err(SacdError::NoData)
        ));

        source.close().unwrap();
        source.close().unwrap();
        assert!(matches!(
            source.read_sectors(0, 1, &mut buf),
            Err(SacdError::Uninitialised)
        ));
    }
}
