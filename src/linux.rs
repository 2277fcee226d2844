//! Raspberry Pi Linux glue: mapping `/dev/gpiomem`, clocks and scheduling.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use embedded_hal::delay::DelayNs;

use crate::capture::MicrosClock;
use crate::registers::{GPIOMEM_SIZE, MappedRegisters};

/// GPIO register device usable without root.
pub const GPIOMEM_PATH: &str = "/dev/gpiomem";

/// Failure to get at the register block.
#[derive(Debug)]
pub enum MapError {
    Open(io::Error),
    Map(io::Error),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Open(e) => write!(f, "error opening device: {e}"),
            MapError::Map(e) => write!(f, "mmap failed: {e}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Open(e) | MapError::Map(e) => Some(e),
        }
    }
}

/// The GPIO register block mapped from a device file.
///
/// Unmapped when dropped.
pub struct GpioMem {
    regs: MappedRegisters,
    base: *mut libc::c_void,
    _file: File,
}

impl GpioMem {
    /// Maps [`GPIOMEM_PATH`].
    pub fn open() -> Result<Self, MapError> {
        Self::open_path(GPIOMEM_PATH)
    }

    /// Maps the first [`GPIOMEM_SIZE`] bytes of `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .map_err(MapError::Open)?;

        // SAFETY: a fresh shared mapping of an open descriptor; the result is
        // checked against MAP_FAILED before use.
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                GPIOMEM_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(MapError::Map(io::Error::last_os_error()));
        }

        // SAFETY: the mapping is page aligned, GPIOMEM_SIZE bytes long and
        // lives until `drop` unmaps it, after `regs` is gone.
        let regs = unsafe { MappedRegisters::new(base.cast::<u8>(), GPIOMEM_SIZE) };
        Ok(GpioMem {
            regs,
            base,
            _file: file,
        })
    }

    pub fn registers(&self) -> &MappedRegisters {
        &self.regs
    }
}

impl Drop for GpioMem {
    fn drop(&mut self) {
        // SAFETY: `base` came from a successful mmap of GPIOMEM_SIZE bytes and
        // no borrow of `regs` can outlive `self`.
        unsafe {
            libc::munmap(self.base, GPIOMEM_SIZE);
        }
    }
}

/// Wall clock microseconds within the current second.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl MicrosClock for SystemClock {
    fn now_us(&mut self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_micros())
            .unwrap_or(0)
    }
}

/// Delay that yields to the scheduler, like `usleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Moves the calling thread to `SCHED_FIFO` at the highest priority.
///
/// Needs `CAP_SYS_NICE`; without it the error is returned and sampling still
/// works, only with more jitter.
pub fn request_realtime_priority() -> io::Result<()> {
    // SAFETY: plain syscalls on the calling thread with a valid sched_param.
    unsafe {
        let priority = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if priority < 0 {
            return Err(io::Error::last_os_error());
        }
        let param = libc::sched_param {
            sched_priority: priority,
        };
        if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
