//! Fact extractors.
//!
//! Each probe answers one question about the host and owns its own failure
//! handling: a missing tool, an unreadable file, or unparseable output
//! degrades to the documented default (empty string, `false`, `0`, empty
//! vec) instead of failing collection. Partial data beats no data.
//!
//! Command output parsing is split into pure `&str` functions so the parsers
//! are testable without the host tooling.

use super::runner::ProbeRunner;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const OS_RELEASE_PATH: &str = "/etc/os-release";
const DMI_VENDOR_PATH: &str = "/sys/class/dmi/id/sys_vendor";
const DMI_MODEL_PATH: &str = "/sys/class/dmi/id/product_name";
const PASSWD_PATH: &str = "/etc/passwd";

/// GNOME ships remote desktop, media sharing, and WebDAV file sharing as
/// user units; remote login is the system sshd.
const REMOTE_DESKTOP_UNIT: &str = "gnome-remote-desktop.service";
const REMOTE_LOGIN_UNITS: [&str; 2] = ["sshd.service", "ssh.service"];
const MULTIMEDIA_SHARING_UNIT: &str = "rygel.service";
const FILE_SHARING_UNIT: &str = "gnome-user-share-webdav.service";

/// Regular-user uid range on common Linux distributions.
const HUMAN_UID_RANGE: std::ops::Range<u32> = 1000..60000;

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// OS pretty name from /etc/os-release. Default: empty string.
pub fn operating_system() -> String {
    match fs::read_to_string(OS_RELEASE_PATH) {
        Ok(contents) => parse_os_release(&contents).unwrap_or_default(),
        Err(e) => {
            debug!(path = OS_RELEASE_PATH, error = %e, "os-release unreadable");
            String::new()
        }
    }
}

/// DMI system vendor. Default: empty string.
pub fn hardware_vendor() -> String {
    read_trimmed(DMI_VENDOR_PATH)
}

/// DMI product name. Default: empty string.
pub fn hardware_model() -> String {
    read_trimmed(DMI_MODEL_PATH)
}

/// Count of human accounts in /etc/passwd. Default: 0.
pub fn user_account_count() -> u32 {
    match fs::read_to_string(PASSWD_PATH) {
        Ok(contents) => count_human_accounts(&contents),
        Err(e) => {
            debug!(path = PASSWD_PATH, error = %e, "passwd unreadable");
            0
        }
    }
}

/// Providers configured in GNOME Online Accounts. Default: empty vec.
pub fn online_account_providers() -> Vec<String> {
    let Some(path) = goa_accounts_path() else {
        return Vec::new();
    };
    match fs::read_to_string(&path) {
        Ok(contents) => parse_goa_providers(&contents),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "GOA accounts unreadable");
            Vec::new()
        }
    }
}

fn goa_accounts_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("goa-1.0").join("accounts.conf"))
}

fn read_trimmed(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(contents) => contents.trim().to_string(),
        Err(e) => {
            debug!(path, error = %e, "file unreadable");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// gsettings
// ---------------------------------------------------------------------------

/// Workspaces limited to the primary display (mutter). Default: false.
pub fn workspaces_on_primary_display_only(runner: &ProbeRunner) -> bool {
    gsettings_bool(runner, "org.gnome.mutter", "workspaces-only-on-primary")
}

/// Dynamic rather than fixed workspace count (mutter). Default: false.
pub fn workspaces_are_dynamic(runner: &ProbeRunner) -> bool {
    gsettings_bool(runner, "org.gnome.mutter", "dynamic-workspaces")
}

/// Apps pinned to the shell dash. Default: empty vec.
pub fn favorited_apps(runner: &ProbeRunner) -> Vec<String> {
    gsettings_string_list(runner, "org.gnome.shell", "favorite-apps")
}

/// Enabled shell extension uuids. Default: empty vec.
pub fn enabled_extensions(runner: &ProbeRunner) -> Vec<String> {
    gsettings_string_list(runner, "org.gnome.shell", "enabled-extensions")
}

fn gsettings_bool(runner: &ProbeRunner, schema: &str, key: &str) -> bool {
    match runner.run("gsettings", &["get", schema, key]) {
        Ok(out) => parse_bool(&out),
        Err(e) => {
            debug!(schema, key, error = %e, "gsettings probe failed");
            false
        }
    }
}

fn gsettings_string_list(runner: &ProbeRunner, schema: &str, key: &str) -> Vec<String> {
    match runner.run("gsettings", &["get", schema, key]) {
        Ok(out) => parse_string_list(&out),
        Err(e) => {
            debug!(schema, key, error = %e, "gsettings probe failed");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// systemd units
// ---------------------------------------------------------------------------

/// GNOME remote desktop sharing enabled. Default: false.
pub fn remote_desktop_enabled(runner: &ProbeRunner) -> bool {
    user_unit_enabled(runner, REMOTE_DESKTOP_UNIT)
}

/// SSH login enabled (distro unit name varies). Default: false.
pub fn remote_login_enabled(runner: &ProbeRunner) -> bool {
    REMOTE_LOGIN_UNITS
        .iter()
        .any(|unit| system_unit_enabled(runner, unit))
}

/// Rygel media sharing enabled. Default: false.
pub fn multimedia_sharing_enabled(runner: &ProbeRunner) -> bool {
    user_unit_enabled(runner, MULTIMEDIA_SHARING_UNIT)
}

/// WebDAV personal file sharing enabled. Default: false.
pub fn file_sharing_enabled(runner: &ProbeRunner) -> bool {
    user_unit_enabled(runner, FILE_SHARING_UNIT)
}

fn system_unit_enabled(runner: &ProbeRunner, unit: &str) -> bool {
    unit_enabled(runner, &["is-enabled", unit], unit)
}

fn user_unit_enabled(runner: &ProbeRunner, unit: &str) -> bool {
    unit_enabled(runner, &["--user", "is-enabled", unit], unit)
}

fn unit_enabled(runner: &ProbeRunner, args: &[&str], unit: &str) -> bool {
    // `systemctl is-enabled` exits non-zero for disabled/unknown units, which
    // the runner reports as an error; both land on false here.
    match runner.run("systemctl", args) {
        Ok(out) => out.trim() == "enabled",
        Err(e) => {
            debug!(unit, error = %e, "systemd unit probe failed");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// flatpak and xdg
// ---------------------------------------------------------------------------

/// Whether flatpak is installed at all. Default: false.
pub fn flatpak_installed(runner: &ProbeRunner) -> bool {
    runner.run("flatpak", &["--version"]).is_ok()
}

/// Whether a remote named flathub is configured. Default: false.
pub fn flathub_enabled(runner: &ProbeRunner) -> bool {
    match runner.run("flatpak", &["remotes", "--columns=name"]) {
        Ok(out) => out.lines().any(|line| line.trim() == "flathub"),
        Err(e) => {
            debug!(error = %e, "flatpak remotes probe failed");
            false
        }
    }
}

/// Application ids of installed flatpak apps. Default: empty vec.
pub fn installed_apps(runner: &ProbeRunner) -> Vec<String> {
    match runner.run("flatpak", &["list", "--app", "--columns=application"]) {
        Ok(out) => out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            debug!(error = %e, "flatpak list probe failed");
            Vec::new()
        }
    }
}

/// Desktop id of the default web browser. Default: empty string.
pub fn default_browser(runner: &ProbeRunner) -> String {
    match runner.run("xdg-settings", &["get", "default-web-browser"]) {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            debug!(error = %e, "default browser probe failed");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Pure parsers
// ---------------------------------------------------------------------------

fn parse_os_release(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?.trim();
        Some(value.trim_matches('"').to_string())
    })
}

fn parse_bool(raw: &str) -> bool {
    raw.trim() == "true"
}

/// Parse a GVariant string array as printed by `gsettings get`, e.g.
/// `['firefox.desktop', 'org.gnome.Nautilus.desktop']` or `@as []`.
///
/// Values are desktop ids and extension uuids, which never contain commas
/// or quotes, so a split on `,` is sufficient.
fn parse_string_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("@as").map(str::trim_start).unwrap_or(raw);
    let inner = match raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner,
        None => return Vec::new(),
    };
    inner
        .split(',')
        .filter_map(|item| {
            let item = item.trim();
            let unquoted = item
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .or_else(|| item.strip_prefix('"').and_then(|s| s.strip_suffix('"')))?;
            if unquoted.is_empty() {
                None
            } else {
                Some(unquoted.to_string())
            }
        })
        .collect()
}

fn count_human_accounts(passwd: &str) -> u32 {
    passwd
        .lines()
        .filter(|line| {
            let mut fields = line.split(':');
            let uid = fields.nth(2).and_then(|raw| raw.parse::<u32>().ok());
            uid.is_some_and(|uid| HUMAN_UID_RANGE.contains(&uid))
        })
        .count() as u32
}

fn parse_goa_providers(conf: &str) -> Vec<String> {
    conf.lines()
        .filter_map(|line| {
            let value = line.trim().strip_prefix("Provider=")?.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_release_pretty_name() {
        let contents = "NAME=Fedora\nPRETTY_NAME=\"Fedora Linux 38 (Workstation Edition)\"\nID=fedora\n";
        assert_eq!(
            parse_os_release(contents).as_deref(),
            Some("Fedora Linux 38 (Workstation Edition)")
        );
    }

    #[test]
    fn os_release_without_pretty_name() {
        assert_eq!(parse_os_release("NAME=Fedora\nID=fedora\n"), None);
    }

    #[test]
    fn bool_output() {
        assert!(parse_bool("true\n"));
        assert!(!parse_bool("false\n"));
        assert!(!parse_bool("garbage"));
    }

    #[test]
    fn string_list_single_quoted() {
        assert_eq!(
            parse_string_list("['firefox.desktop', 'org.gnome.Nautilus.desktop']\n"),
            vec!["firefox.desktop", "org.gnome.Nautilus.desktop"]
        );
    }

    #[test]
    fn string_list_empty_variants() {
        assert!(parse_string_list("[]").is_empty());
        assert!(parse_string_list("@as []").is_empty());
        assert!(parse_string_list("").is_empty());
        assert!(parse_string_list("not a list").is_empty());
    }

    #[test]
    fn string_list_double_quoted() {
        assert_eq!(
            parse_string_list("[\"a.desktop\", \"b.desktop\"]"),
            vec!["a.desktop", "b.desktop"]
        );
    }

    #[test]
    fn human_account_counting() {
        let passwd = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
alice:x:1000:1000:Alice:/home/alice:/bin/bash
bob:x:1001:1001:Bob:/home/bob:/bin/zsh
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
";
        assert_eq!(count_human_accounts(passwd), 2);
    }

    #[test]
    fn human_account_counting_skips_malformed_lines() {
        assert_eq!(count_human_accounts("garbage\n::\n"), 0);
    }

    #[test]
    fn goa_providers() {
        let conf = "\
[Account account_1]
Provider=google
Identity=alice@example.com

[Account account_2]
Provider=nextcloud
";
        assert_eq!(parse_goa_providers(conf), vec!["google", "nextcloud"]);
    }

    #[test]
    fn goa_providers_empty_config() {
        assert!(parse_goa_providers("").is_empty());
    }
}
