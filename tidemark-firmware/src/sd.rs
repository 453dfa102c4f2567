//! SD card storage glue
//!
//! Wraps embedded-sdmmc behind the small surface the control task
//! needs: probe/mount at session start, config-file read, log-file
//! create/append/sync. The card stack is built once at boot; mounting
//! is deferred to the first session start so a missing card just
//! raises a storage-init fault and the next button press retries.

use core::fmt::Write as _;

use defmt::warn;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Delay, Instant};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{
    Mode, RawDirectory, RawFile, RawVolume, SdCard, TimeSource, Timestamp, VolumeIdx,
    VolumeManager,
};
use heapless::String;

/// Name of the channel configuration file on the card.
pub const CONFIG_FILE: &str = "ADC.TXT";

/// SPI clock during card identification. SD cards must be enumerated
/// below 400 kHz.
pub const SD_SPI_INIT_FREQ: u32 = 400_000;

/// SPI clock once the card has answered.
const SD_SPI_WORK_FREQ: u32 = 16_000_000;

type SdSpi = Spi<'static, SPI0, Blocking>;
type SdCs = Output<'static>;
type SdSpiDev = ExclusiveDevice<SdSpi, SdCs, Delay>;
type SdDevice = SdCard<SdSpiDev, Delay>;
type SdVolumeManager = VolumeManager<SdDevice, UptimeSource>;

/// Storage failures, collapsed to what the fault model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// SPI device setup failed.
    SpiSetup,
    /// Card did not respond or the volume would not mount.
    Mount,
    /// Requested file does not exist.
    NotFound,
    /// Read, write, or sync failed.
    Io,
}

fn map_err<E>(err: embedded_sdmmc::Error<E>) -> StorageError {
    match err {
        embedded_sdmmc::Error::NotFound => StorageError::NotFound,
        embedded_sdmmc::Error::DeviceError(_) => StorageError::Mount,
        _ => StorageError::Io,
    }
}

/// Timestamp source for FAT metadata: board has no battery-backed
/// calendar, so file timestamps are uptime offsets from a fixed base
/// date. Good enough to order files on the card.
pub struct UptimeSource;

impl TimeSource for UptimeSource {
    fn get_timestamp(&self) -> Timestamp {
        let uptime = Instant::now().as_secs();
        let hours = ((uptime / 3600) % 24) as u8;
        let minutes = ((uptime / 60) % 60) as u8;
        let seconds = (uptime % 60) as u8;
        Timestamp::from_calendar(2025, 1, 1, hours, minutes, seconds)
            .unwrap_or(Timestamp::from_fat(0, 0))
    }
}

struct Mounted {
    volume: RawVolume,
    root: RawDirectory,
}

/// The card stack plus the currently open log file, if any.
pub struct SdStorage {
    volume_mgr: SdVolumeManager,
    mounted: Option<Mounted>,
    file: Option<RawFile>,
}

impl SdStorage {
    /// Build the card stack. No bus traffic happens here; the card is
    /// first touched by [`SdStorage::init`].
    pub fn new(spi: SdSpi, cs: SdCs) -> Result<Self, StorageError> {
        let spi_dev = ExclusiveDevice::new(spi, cs, Delay).map_err(|_| StorageError::SpiSetup)?;
        let card = SdCard::new(spi_dev, Delay);
        Ok(Self {
            volume_mgr: VolumeManager::new(card, UptimeSource),
            mounted: None,
            file: None,
        })
    }

    /// Probe the card and mount the first volume. Idempotent: once
    /// mounted, later calls are no-ops.
    pub fn init(&mut self) -> Result<(), StorageError> {
        if self.mounted.is_some() {
            return Ok(());
        }
        // Probe at the identification clock, then switch to the
        // working clock for everything that follows.
        if self.volume_mgr.device(|card| card.num_bytes()).is_err() {
            // Forces a full re-enumeration on the next attempt, so a
            // card inserted after a failed start is picked up.
            self.volume_mgr.device(|card| card.mark_card_uninit());
            return Err(StorageError::Mount);
        }
        self.volume_mgr
            .device(|card| card.spi(|dev| dev.bus_mut().set_frequency(SD_SPI_WORK_FREQ)));
        let volume = self
            .volume_mgr
            .open_raw_volume(VolumeIdx(0))
            .map_err(map_err)?;
        let root = match self.volume_mgr.open_root_dir(volume) {
            Ok(root) => root,
            Err(err) => {
                let _ = self.volume_mgr.close_volume(volume);
                return Err(map_err(err));
            }
        };
        self.mounted = Some(Mounted { volume, root });
        Ok(())
    }

    fn root(&self) -> Result<RawDirectory, StorageError> {
        self.mounted
            .as_ref()
            .map(|m| m.root)
            .ok_or(StorageError::Mount)
    }

    /// Read the channel configuration file into `buf`, returning the
    /// text that was read. A file that fills `buf` completely is
    /// rejected rather than silently truncated mid-line.
    pub fn read_config_into<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a str, StorageError> {
        let root = self.root()?;
        let file = self
            .volume_mgr
            .open_file_in_dir(root, CONFIG_FILE, Mode::ReadOnly)
            .map_err(map_err)?;
        let result = self.volume_mgr.read(file, buf).map_err(map_err);
        let _ = self.volume_mgr.close_file(file);
        let len = result?;
        if len == buf.len() {
            warn!("{} larger than {} bytes", CONFIG_FILE, buf.len());
            return Err(StorageError::Io);
        }
        core::str::from_utf8(&buf[..len]).map_err(|_| StorageError::Io)
    }

    /// Create (or truncate) and open the log file for this session.
    pub fn open_log(&mut self, name: &str) -> Result<(), StorageError> {
        self.close_log();
        let root = self.root()?;
        let file = self
            .volume_mgr
            .open_file_in_dir(root, name, Mode::ReadWriteCreateOrTruncate)
            .map_err(map_err)?;
        self.file = Some(file);
        Ok(())
    }

    /// Append one block of bytes to the open log file.
    pub fn append(&mut self, data: &[u8]) -> Result<(), StorageError> {
        let file = self.file.ok_or(StorageError::Io)?;
        self.volume_mgr.write(file, data).map_err(map_err)
    }

    /// Push buffered file data and directory metadata out to the card.
    pub fn sync(&mut self) -> Result<(), StorageError> {
        let file = self.file.ok_or(StorageError::Io)?;
        self.volume_mgr.flush_file(file).map_err(map_err)
    }

    /// Close the log file if one is open.
    pub fn close_log(&mut self) {
        if let Some(file) = self.file.take() {
            if self.volume_mgr.close_file(file).is_err() {
                warn!("log file close failed");
            }
        }
    }
}

/// Log file name from the time of day: `HH-MM-SS.CSV`.
pub fn log_file_name(hour: u8, minute: u8, second: u8) -> String<12> {
    let mut name = String::new();
    let _ = write!(name, "{:02}-{:02}-{:02}.CSV", hour, minute, second);
    name
}
