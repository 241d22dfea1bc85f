//! Authenticated optical-drive sector source.
//!
//! The vendor protocol (BD authentication, SAC key exchange, sector
//! decryption) lives behind the [`DriveAccess`] trait and is supplied
//! by the embedding application; this module only sequences those
//! operations and tracks the authentication state.

use super::{SectorFormat, SectorGeometry, SectorSource};
use crate::{SacdError, SacdResult, SACD_LSN_SIZE};

/// Low-level drive operations supplied by an external collaborator.
/// The drive is expected to be open when handed over.
pub trait DriveAccess {
    /// Number of sectors reported by the drive. Called again after
    /// authentication, which can change the reported size.
    fn total_sectors(&mut self) -> SacdResult<u32>;

    /// Perform BD authentication against the drive
    fn bd_authenticate(&mut self) -> SacdResult<()>;

    /// Perform the SAC key exchange. Only meaningful after a
    /// successful BD authentication.
    fn sac_key_exchange(&mut self) -> SacdResult<()>;

    /// Read `count` native 2048-byte sectors starting at `lsn`
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32>;

    /// Decrypt `count` sectors in place using the exchanged key
    fn decrypt(&mut self, buf: &mut [u8], count: u32) -> SacdResult<()>;

    /// Release the drive handle
    fn close(&mut self) -> SacdResult<()>;
}

/// Sector source backed by an optical drive
pub struct DriveSource<D: DriveAccess> {
    /// Drive handle, `None` once closed
    drive: Option<D>,
    total_sectors: u32,
    authenticated: bool,
}

impl<D: DriveAccess> DriveSource<D> {
    /// Wrap an open drive handle
    pub fn new(mut drive: D) -> SacdResult<DriveSource<D>> {
        let total_sectors = drive.total_sectors()?;

        Ok(DriveSource {
            drive: Some(drive),
            total_sectors,
            authenticated: false,
        })
    }

    fn drive_mut(&mut self) -> SacdResult<&mut D> {
        match self.drive.as_mut() {
            Some(d) => Ok(d),
            None => Err(SacdError::Uninitialised),
        }
    }
}

impl<D: DriveAccess> SectorSource for DriveSource<D> {
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32> {
        if buf.len() < count as usize * SACD_LSN_SIZE {
            return Err(SacdError::InvalidArgument);
        }

        let total = self.total_sectors;

        if lsn >= total {
            return Err(SacdError::NoData);
        }

        let count = count.min(total - lsn);

        self.drive_mut()?.read_sectors(lsn, count, buf)
    }

    fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    fn geometry(&self) -> SectorGeometry {
        SectorFormat::Plain2048.geometry()
    }

    fn close(&mut self) -> SacdResult<()> {
        if let Some(mut drive) = self.drive.take() {
            self.authenticated = false;

            drive.close()?;
        }

        Ok(())
    }

    fn authenticate(&mut self) -> SacdResult<()> {
        let drive = self.drive_mut()?;

        if drive.bd_authenticate().is_err() {
            return Err(SacdError::AuthFailed);
        }

        if drive.sac_key_exchange().is_err() {
            return Err(SacdError::AuthFailed);
        }

        // The drive can report a different sector count once
        // authenticated
        self.total_sectors = self.drive_mut()?.total_sectors()?;
        self.authenticated = true;

        debug!("drive authenticated, {} sectors", self.total_sectors);

        Ok(())
    }

    fn decrypt(&mut self, buf: &mut [u8], count: u32) -> SacdResult<()> {
        if !self.authenticated {
            return Err(SacdError::DecryptFailed);
        }

        self.drive_mut()?.decrypt(buf, count)
    }

    fn can_decrypt(&self) -> bool {
        self.authenticated
    }
}
