//! Persisted user preferences.
//!
//! Three byte slots stored as one blob in namespace `light`, key `prefs`:
//!
//! | slot | meaning |
//! |------|---------|
//! | 0 | last on/off (0/1) |
//! | 1 | startup behaviour |
//! | 2 | scene id |
//!
//! Read once at boot; written synchronously by the control surface.

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub const PREFS_NAMESPACE: &str = "light";
pub const PREFS_KEY: &str = "prefs";

pub const SLOT_LAST_ON: usize = 0;
pub const SLOT_STARTUP: usize = 1;
pub const SLOT_SCENE: usize = 2;
pub const PREFS_LEN: usize = 3;

/// What the light does when power returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StartupBehavior {
    /// Restore the on/off state recorded before power loss.
    #[default]
    ResumeLast = 0,
    ForceOn = 1,
    ForceOff = 2,
}

impl StartupBehavior {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::ResumeLast),
            1 => Some(Self::ForceOn),
            2 => Some(Self::ForceOff),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub last_on: bool,
    pub startup: StartupBehavior,
    pub scene: u8,
}

impl Preferences {
    pub fn to_bytes(&self) -> [u8; PREFS_LEN] {
        let mut raw = [0u8; PREFS_LEN];
        raw[SLOT_LAST_ON] = u8::from(self.last_on);
        raw[SLOT_STARTUP] = self.startup.as_u8();
        raw[SLOT_SCENE] = self.scene;
        raw
    }

    /// Decode a stored blob.  Short blobs leave the missing slots at their
    /// defaults; an unknown startup byte falls back to resume-last.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut prefs = Self::default();
        if let Some(&b) = raw.get(SLOT_LAST_ON) {
            prefs.last_on = b == 1;
        }
        if let Some(&b) = raw.get(SLOT_STARTUP) {
            prefs.startup = StartupBehavior::from_u8(b).unwrap_or_else(|| {
                warn!("prefs: unknown startup value {b}, using resume-last");
                StartupBehavior::ResumeLast
            });
        }
        if let Some(&b) = raw.get(SLOT_SCENE) {
            prefs.scene = b;
        }
        prefs
    }

    /// Whether the light powers up on.
    pub fn boot_power_on(&self) -> bool {
        match self.startup {
            StartupBehavior::ForceOn => true,
            StartupBehavior::ForceOff => false,
            StartupBehavior::ResumeLast => self.last_on,
        }
    }

    /// Record the on/off state for resume-last.  Returns `true` if the
    /// stored value changed and must be written.
    pub fn record_power(&mut self, on: bool) -> bool {
        if self.startup != StartupBehavior::ResumeLast || self.last_on == on {
            return false;
        }
        self.last_on = on;
        true
    }
}

/// Load preferences; a missing blob yields defaults.
pub fn load(store: &impl StoragePort) -> Result<Preferences, StorageError> {
    let mut raw = [0u8; PREFS_LEN];
    match store.read(PREFS_NAMESPACE, PREFS_KEY, &mut raw) {
        Ok(len) => {
            let prefs = Preferences::from_bytes(&raw[..len]);
            info!("prefs: loaded {:?}", prefs);
            Ok(prefs)
        }
        Err(StorageError::NotFound) => {
            info!("prefs: none stored, using defaults");
            Ok(Preferences::default())
        }
        Err(e) => Err(e),
    }
}

pub fn save(store: &mut impl StoragePort, prefs: &Preferences) -> Result<(), StorageError> {
    store.write(PREFS_NAMESPACE, PREFS_KEY, &prefs.to_bytes())
}
