//! Change hooks.
//!
//! The application implements `ApplyHooks` once and hands it to the store.
//! Each method receives the field's (old, new) values. Methods default to
//! no-ops so an implementation only overrides what it propagates.
//!
//! Hooks run after the store lock is released and may run on any thread. A
//! hook may open a new accessor on the same store.

use crate::settings::fields::TrayIconBatteryBehavior;

pub trait ApplyHooks: Send + Sync {
    fn auto_run(&self, _old: bool, _new: bool) {}

    fn low_audio_latency(&self, _old: bool, _new: bool) {}

    fn automatic_ear_detection(&self, _old: bool, _new: bool) {}

    fn rssi_min(&self, _old: i16, _new: i16) {}

    fn device_address(&self, _old: u64, _new: u64) {}

    fn tray_icon_battery(&self, _old: TrayIconBatteryBehavior, _new: TrayIconBatteryBehavior) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ApplyHooks for NoopHooks {}

/// Hooks that only record what would be propagated. Used by the CLI, which
/// has no device or tray to drive.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl ApplyHooks for LoggingHooks {
    fn auto_run(&self, old: bool, new: bool) {
        tracing::info!(old, new, "Applying auto_run");
    }

    fn low_audio_latency(&self, old: bool, new: bool) {
        tracing::info!(old, new, "Applying low_audio_latency");
    }

    fn automatic_ear_detection(&self, old: bool, new: bool) {
        tracing::info!(old, new, "Applying automatic_ear_detection");
    }

    fn rssi_min(&self, old: i16, new: i16) {
        tracing::info!(old, new, "Applying rssi_min");
    }

    fn device_address(&self, _old: u64, new: u64) {
        tracing::info!(bound = new != 0, "Applying device_address");
    }

    fn tray_icon_battery(&self, old: TrayIconBatteryBehavior, new: TrayIconBatteryBehavior) {
        tracing::info!(%old, %new, "Applying tray_icon_battery");
    }
}
