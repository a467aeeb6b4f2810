//! Diagnostic record: the immutable snapshot handed to review and upload.

use serde::{Deserialize, Serialize};

/// One snapshot of host facts.
///
/// Created exactly once per `collect()` call and never mutated afterwards;
/// the flow hands it to the frontend and the uploader by shared reference
/// only. The serde field names (camelCase) are the wire contract with the
/// collection endpoint and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    /// Pseudonymous installation identifier (salted hash, not reversible).
    pub identifier: String,

    /// OS pretty name, e.g. "Fedora Linux 38 (Workstation Edition)".
    pub operating_system: String,

    /// DMI system vendor.
    pub hardware_vendor: String,

    /// DMI product name.
    pub hardware_model: String,

    pub workspaces_on_primary_display_only: bool,
    pub workspaces_are_dynamic: bool,
    pub remote_desktop_enabled: bool,
    pub remote_login_enabled: bool,
    pub multimedia_sharing_enabled: bool,
    pub file_sharing_enabled: bool,
    pub flathub_enabled: bool,
    pub flatpak_installed: bool,

    /// Desktop id of the default web browser handler.
    pub default_browser: String,

    /// Human account count (uid in the regular-user range).
    pub user_account_count: u32,

    /// Empty sequences are valid, reportable states, not errors.
    pub online_account_providers: Vec<String>,
    pub favorited_apps: Vec<String>,
    pub installed_apps: Vec<String>,
    pub enabled_extensions: Vec<String>,
}

impl DiagnosticRecord {
    /// Serialize to the wire payload sent to the collection endpoint.
    pub fn to_wire(&self) -> census_common::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fixture record for unit tests across the crate.
#[cfg(test)]
pub(crate) fn sample_record() -> DiagnosticRecord {
    DiagnosticRecord {
        identifier: "0a".repeat(32),
        operating_system: "Fedora Linux 38 (Workstation Edition)".into(),
        hardware_vendor: "LENOVO".into(),
        hardware_model: "20QV000QGE".into(),
        workspaces_on_primary_display_only: true,
        workspaces_are_dynamic: true,
        remote_desktop_enabled: false,
        remote_login_enabled: true,
        multimedia_sharing_enabled: false,
        file_sharing_enabled: false,
        flathub_enabled: true,
        flatpak_installed: true,
        default_browser: "org.mozilla.firefox.desktop".into(),
        user_account_count: 2,
        online_account_providers: vec!["google".into()],
        favorited_apps: vec![
            "org.gnome.Nautilus.desktop".into(),
            "org.mozilla.firefox.desktop".into(),
        ],
        installed_apps: vec!["org.gnome.Calculator".into()],
        enabled_extensions: vec!["appindicatorsupport@rgcjonas.gmail.com".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip_preserves_all_fields() {
        let record = sample_record();
        let wire = record.to_wire().unwrap();
        let back: DiagnosticRecord = serde_json::from_str(&wire).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn wire_field_names_are_stable() {
        let wire = sample_record().to_wire().unwrap();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "identifier",
            "operatingSystem",
            "hardwareVendor",
            "hardwareModel",
            "workspacesOnPrimaryDisplayOnly",
            "workspacesAreDynamic",
            "remoteDesktopEnabled",
            "remoteLoginEnabled",
            "multimediaSharingEnabled",
            "fileSharingEnabled",
            "flathubEnabled",
            "flatpakInstalled",
            "defaultBrowser",
            "userAccountCount",
            "onlineAccountProviders",
            "favoritedApps",
            "installedApps",
            "enabledExtensions",
        ] {
            assert!(object.contains_key(key), "missing wire field {key}");
        }
        assert_eq!(object.len(), 18, "unexpected extra wire fields");
    }

    #[test]
    fn empty_sequences_survive_the_wire() {
        let mut record = sample_record();
        record.online_account_providers.clear();
        record.favorited_apps.clear();
        record.installed_apps.clear();
        record.enabled_extensions.clear();

        let back: DiagnosticRecord =
            serde_json::from_str(&record.to_wire().unwrap()).unwrap();
        assert!(back.online_account_providers.is_empty());
        assert!(back.enabled_extensions.is_empty());
    }
}
