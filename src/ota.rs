//! Firmware update over HTTP, backed by the `esp-ota` crate.
//!
//! Flow: authorize → begin → N × write → finalize → reboot
//!
//! One session at a time.  Any failure aborts the session, is classified
//! into an [`UpdateFailure`] category, logged, and never retried; the
//! uploader has to start over.

use core::fmt;
use log::{error, info, warn};

const MAX_FIRMWARE_SIZE: u32 = 4 * 1024 * 1024; // 4 MB

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    AuthFailed,
    AlreadyInProgress,
    InvalidSize,
    NoPartition,
    BeginFailed,
    ConnectionLost,
    WriteFailed,
    VerifyFailed,
    BootSetFailed,
    IncompleteTransfer,
    NotReceiving,
    Overflow,
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthFailed => write!(f, "update token rejected"),
            Self::AlreadyInProgress => write!(f, "update already in progress"),
            Self::InvalidSize => write!(f, "firmware size out of range (max 4 MB)"),
            Self::NoPartition => write!(f, "no inactive OTA partition available"),
            Self::BeginFailed => write!(f, "OTA begin failed"),
            Self::ConnectionLost => write!(f, "upload connection lost"),
            Self::WriteFailed => write!(f, "OTA write failed"),
            Self::VerifyFailed => write!(f, "OTA verification failed"),
            Self::BootSetFailed => write!(f, "set boot partition failed"),
            Self::IncompleteTransfer => write!(f, "upload ended before all bytes arrived"),
            Self::NotReceiving => write!(f, "no update in progress"),
            Self::Overflow => write!(f, "upload exceeds declared firmware size"),
        }
    }
}

/// Coarse failure category reported to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFailure {
    Auth,
    Begin,
    Connect,
    Receive,
    End,
}

/// Log a failure that did not pass through a session and return its class.
pub fn report(e: OtaError) -> UpdateFailure {
    let class = UpdateFailure::classify(e);
    warn!("OTA: {class}: {e}");
    class
}

impl UpdateFailure {
    pub fn classify(e: OtaError) -> Self {
        match e {
            OtaError::AuthFailed => Self::Auth,
            OtaError::AlreadyInProgress
            | OtaError::InvalidSize
            | OtaError::NoPartition
            | OtaError::BeginFailed => Self::Begin,
            OtaError::ConnectionLost => Self::Connect,
            OtaError::WriteFailed | OtaError::Overflow | OtaError::NotReceiving => Self::Receive,
            OtaError::VerifyFailed | OtaError::BootSetFailed | OtaError::IncompleteTransfer => Self::End,
        }
    }
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "Auth Failed",
            Self::Begin => "Begin Failed",
            Self::Connect => "Connect Failed",
            Self::Receive => "Receive Failed",
            Self::End => "End Failed",
        };
        f.write_str(s)
    }
}

/// Check the `X-Update-Token` header.  An empty configured token disables
/// the check.
pub fn authorize(configured: &str, presented: Option<&str>) -> Result<(), OtaError> {
    if configured.is_empty() || presented == Some(configured) {
        Ok(())
    } else {
        Err(OtaError::AuthFailed)
    }
}

// ── State machine ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaState {
    Idle,
    Receiving { expected_size: u32, bytes_written: u32 },
    Verifying,
    ReadyToReboot,
    Failed(UpdateFailure),
}

/// Firmware update session.
///
/// On ESP-IDF targets writes go to the inactive OTA partition; on
/// simulation targets only the byte accounting runs.
pub struct OtaManager {
    state: OtaState,
    #[cfg(target_os = "espidf")]
    ota_update: Option<esp_ota::OtaUpdate>,
}

impl OtaManager {
    pub fn new() -> Self {
        Self {
            state: OtaState::Idle,
            #[cfg(target_os = "espidf")]
            ota_update: None,
        }
    }

    pub fn state(&self) -> OtaState {
        self.state
    }

    /// Begin a session.  Validates size and opens the inactive partition.
    pub fn begin(&mut self, firmware_size: u32) -> Result<(), OtaError> {
        if matches!(self.state, OtaState::Receiving { .. } | OtaState::Verifying) {
            report(OtaError::AlreadyInProgress);
            return Err(OtaError::AlreadyInProgress);
        }
        if firmware_size == 0 || firmware_size > MAX_FIRMWARE_SIZE {
            return Err(self.fail(OtaError::InvalidSize));
        }

        #[cfg(target_os = "espidf")]
        {
            let update = esp_ota::OtaUpdate::begin().map_err(|e| {
                warn!("esp-ota begin failed: {:?}", e);
                self.fail(OtaError::BeginFailed)
            })?;
            self.ota_update = Some(update);
        }

        self.state = OtaState::Receiving {
            expected_size: firmware_size,
            bytes_written: 0,
        };
        info!("OTA: begin ({} bytes)", firmware_size);
        Ok(())
    }

    /// Append the next chunk.  Returns total bytes written.
    pub fn write(&mut self, data: &[u8]) -> Result<u32, OtaError> {
        let OtaState::Receiving { expected_size, bytes_written } = self.state else {
            return Err(OtaError::NotReceiving);
        };

        let new_written = bytes_written.saturating_add(data.len() as u32);
        if new_written > expected_size {
            return Err(self.fail(OtaError::Overflow));
        }

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.as_mut() else {
                return Err(self.fail(OtaError::NotReceiving));
            };
            if let Err(e) = update.write(data) {
                warn!("esp-ota write failed: {:?}", e);
                return Err(self.fail(OtaError::WriteFailed));
            }
        }

        self.state = OtaState::Receiving {
            expected_size,
            bytes_written: new_written,
        };
        Ok(new_written)
    }

    /// Verify the image and mark the partition bootable.
    pub fn finalize(&mut self) -> Result<(), OtaError> {
        match self.state {
            OtaState::Receiving { expected_size, bytes_written } if bytes_written == expected_size => {}
            OtaState::Receiving { .. } => return Err(self.fail(OtaError::IncompleteTransfer)),
            _ => return Err(OtaError::NotReceiving),
        }

        self.state = OtaState::Verifying;

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.take() else {
                return Err(self.fail(OtaError::NotReceiving));
            };
            let mut completed = match update.finalize() {
                Ok(c) => c,
                Err(e) => {
                    warn!("esp-ota finalize failed: {:?}", e);
                    return Err(self.fail(OtaError::VerifyFailed));
                }
            };
            if let Err(e) = completed.set_as_boot_partition() {
                warn!("esp-ota set_as_boot_partition failed: {:?}", e);
                return Err(self.fail(OtaError::BootSetFailed));
            }
        }

        self.state = OtaState::ReadyToReboot;
        info!("OTA: finalized, ready to reboot");
        Ok(())
    }

    /// The upload transport dropped mid-stream.
    pub fn connection_lost(&mut self) -> OtaError {
        self.fail(OtaError::ConnectionLost)
    }

    /// Abort the current session; resets to Idle.
    pub fn abort(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            // dropping OtaUpdate aborts the partition write
            self.ota_update.take();
        }
        self.state = OtaState::Idle;
        warn!("OTA: aborted");
    }

    /// Soft-reset into the newly flashed image.
    #[cfg(target_os = "espidf")]
    pub fn reboot(&self) -> ! {
        info!("OTA: rebooting into new firmware");
        esp_ota::restart();
    }

    fn fail(&mut self, e: OtaError) -> OtaError {
        let class = UpdateFailure::classify(e);
        error!("OTA: {class}: {e}");
        #[cfg(target_os = "espidf")]
        {
            self.ota_update.take();
        }
        self.state = OtaState::Failed(class);
        e
    }
}

impl Default for OtaManager {
    fn default() -> Self {
        Self::new()
    }
}

// ── Boot validation ───────────────────────────────────────────

/// Mark the running image valid so the bootloader cancels rollback.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    log::info!("OTA rollback check (simulation): skipped");
}

// ── Tests ─────────────────────────────────────────────────────
