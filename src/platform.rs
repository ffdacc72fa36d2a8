//! Host platform report for the `info` command.

use serde::Serialize;
use std::{env::consts, fmt::Write as _, fs};
use tracing::debug;

/// Shown for values the platform does not report.
pub const NOT_FOUND: &str = "(not found)";

const STD_COLUMN: usize = 14;
const WIDE_COLUMN: usize = 28;

/// One labelled value in a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Row label, e.g. `Machine`
    pub label: String,
    /// Reported value, or [`NOT_FOUND`]
    pub value: String,
}

impl Field {
    fn new(label: &str, value: Option<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| NOT_FOUND.to_string()),
        }
    }
}

/// Snapshot of the host system and the running binary.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    /// Summary string, e.g. `linux-x86_64`
    pub platform: String,
    /// Operating system, host name, kernel release, machine
    pub system: Vec<Field>,
    /// Build details of this binary
    pub runtime: Vec<Field>,
    /// Section title for [`Self::os_specific`]
    pub os_name: String,
    /// Extra rows only some systems provide
    pub os_specific: Vec<Field>,
}

impl PlatformInfo {
    /// Gathers information about the current host.
    #[must_use]
    pub fn collect() -> Self {
        let os_name = system_name().to_string();
        let node = hostname::get()
            .ok()
            .map(|name| name.to_string_lossy().into_owned());

        let system = vec![
            Field::new("System", Some(os_name.clone())),
            Field::new("Node", node),
            Field::new("Release", kernel_release()),
            Field::new("Machine", Some(consts::ARCH.to_string())),
            Field::new("Family", Some(consts::FAMILY.to_string())),
        ];

        let runtime = vec![
            Field::new("xplat Version", Some(env!("CARGO_PKG_VERSION").to_string())),
            Field::new("Target OS", Some(consts::OS.to_string())),
            Field::new("Target Arch", Some(consts::ARCH.to_string())),
            Field::new("Target Family", Some(consts::FAMILY.to_string())),
            Field::new("Pointer Width", Some(format!("{} bit", usize::BITS))),
        ];

        let info = Self {
            platform: format!("{}-{}", consts::OS, consts::ARCH),
            system,
            runtime,
            os_name,
            os_specific: os_specific(),
        };
        debug!(platform = %info.platform, "Collected platform info");
        info
    }

    /// Renders the text report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&header("Platform"));
        out.push_str(&self.platform);
        out.push('\n');

        out.push_str(&header("System"));
        for field in &self.system {
            out.push_str(&row(field, STD_COLUMN));
        }

        out.push_str(&header("Runtime"));
        for field in &self.runtime {
            out.push_str(&row(field, WIDE_COLUMN));
        }

        if !self.os_specific.is_empty() {
            out.push_str(&header(&self.os_name));
            for field in &self.os_specific {
                out.push_str(&row(field, WIDE_COLUMN));
            }
        }

        out
    }
}

fn header(label: &str) -> String {
    let padding = "-".repeat(WIDE_COLUMN.saturating_sub(label.len()));
    format!("\n-- {label} Information {padding}\n")
}

fn row(field: &Field, tab_stop: usize) -> String {
    let mut line = String::new();
    let padding = " ".repeat(tab_stop.saturating_sub(field.label.len()));
    let _ = writeln!(line, "{}: {padding} {}", field.label, field.value);
    line
}

fn system_name() -> &'static str {
    match consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        _ => consts::OS,
    }
}

fn kernel_release() -> Option<String> {
    if cfg!(target_os = "linux") {
        fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
    } else {
        None
    }
}

fn os_specific() -> Vec<Field> {
    if cfg!(target_os = "linux") {
        let distribution = fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|text| os_release_value(&text, "PRETTY_NAME"));
        vec![Field::new("Distribution", distribution)]
    } else {
        Vec::new()
    }
}

/// Reads `KEY=value` from os-release text, dropping surrounding quotes.
fn os_release_value(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches(['"', '\'']).to_string())
    })
}
