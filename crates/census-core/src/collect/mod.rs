//! Host fact collection.
//!
//! This module assembles the diagnostic record shown to the user and, on
//! opt-in, submitted to the collection endpoint:
//! - Fact extractors (probes), each degrading to a default on failure
//! - A bounded runner for probes that shell out to desktop tooling
//! - The record type with its fixed wire field names
//!
//! Collection never fails, performs no writes and no network I/O.

pub mod probes;
mod runner;
mod types;

pub use runner::{ProbeRunner, RunnerError, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_SECS};
pub use types::DiagnosticRecord;

use std::time::Instant;
use tracing::{debug, span, Level};

/// Collect one immutable snapshot of host facts.
///
/// Invokes every probe exactly once. Repeated calls are safe and may observe
/// changed host state; only `identifier` is guaranteed stable across calls
/// within one installation.
pub fn collect() -> DiagnosticRecord {
    let _span = span!(Level::DEBUG, "collect").entered();
    let start = Instant::now();
    let runner = ProbeRunner::default();

    let record = DiagnosticRecord {
        identifier: census_common::installation_id(),
        operating_system: probes::operating_system(),
        hardware_vendor: probes::hardware_vendor(),
        hardware_model: probes::hardware_model(),
        workspaces_on_primary_display_only: probes::workspaces_on_primary_display_only(&runner),
        workspaces_are_dynamic: probes::workspaces_are_dynamic(&runner),
        remote_desktop_enabled: probes::remote_desktop_enabled(&runner),
        remote_login_enabled: probes::remote_login_enabled(&runner),
        multimedia_sharing_enabled: probes::multimedia_sharing_enabled(&runner),
        file_sharing_enabled: probes::file_sharing_enabled(&runner),
        flathub_enabled: probes::flathub_enabled(&runner),
        flatpak_installed: probes::flatpak_installed(&runner),
        default_browser: probes::default_browser(&runner),
        user_account_count: probes::user_account_count(),
        online_account_providers: probes::online_account_providers(),
        favorited_apps: probes::favorited_apps(&runner),
        installed_apps: probes::installed_apps(&runner),
        enabled_extensions: probes::enabled_extensions(&runner),
    };

    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        installed_apps = record.installed_apps.len(),
        extensions = record.enabled_extensions.len(),
        "collection finished"
    );
    record
}

#[cfg(test)]
pub(crate) use types::sample_record;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_stable_across_collections() {
        let first = collect();
        let second = collect();
        assert_eq!(first.identifier, second.identifier);
    }

    #[test]
    fn collection_never_panics_without_desktop_tooling() {
        // On hosts without gsettings/flatpak/systemctl every probe falls back
        // to its default; the record must still materialize.
        let record = collect();
        assert_eq!(record.identifier.len(), 64);
    }
}
