//! Shared utilities for integration tests.

use std::sync::{Mutex, MutexGuard};

use earbuds_settings::settings::{
    ApplyHooks, Blob, Result, SettingsBackend, SettingsError, TrayIconBatteryBehavior,
};

/// One observed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    AutoRun(bool, bool),
    LowAudioLatency(bool, bool),
    AutomaticEarDetection(bool, bool),
    RssiMin(i16, i16),
    DeviceAddress(u64, u64),
    TrayIconBattery(TrayIconBatteryBehavior, TrayIconBatteryBehavior),
}

/// Records every hook invocation in order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    pub fn calls(&self) -> Vec<HookCall> {
        self.lock().clone()
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, call: HookCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HookCall>> {
        self.calls.lock().unwrap()
    }
}

impl ApplyHooks for RecordingHooks {
    fn auto_run(&self, old: bool, new: bool) {
        self.push(HookCall::AutoRun(old, new));
    }

    fn low_audio_latency(&self, old: bool, new: bool) {
        self.push(HookCall::LowAudioLatency(old, new));
    }

    fn automatic_ear_detection(&self, old: bool, new: bool) {
        self.push(HookCall::AutomaticEarDetection(old, new));
    }

    fn rssi_min(&self, old: i16, new: i16) {
        self.push(HookCall::RssiMin(old, new));
    }

    fn device_address(&self, old: u64, new: u64) {
        self.push(HookCall::DeviceAddress(old, new));
    }

    fn tray_icon_battery(&self, old: TrayIconBatteryBehavior, new: TrayIconBatteryBehavior) {
        self.push(HookCall::TrayIconBattery(old, new));
    }
}

/// Backend whose writes always fail.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FailingBackend;

impl SettingsBackend for FailingBackend {
    fn read(&self) -> Result<Option<Blob>> {
        Ok(None)
    }

    fn write(&self, _blob: &Blob) -> Result<()> {
        Err(SettingsError::Storage {
            path: "/unavailable/settings.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }
}
