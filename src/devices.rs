//! Removable device discovery from sysfs
//!
//! Only whole disks flagged removable are reported, with their partitions.
//! Virtual and optical devices are skipped outright.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the kernel lists block devices
pub const SYS_BLOCK: &str = "/sys/block";

/// sysfs `size` is always in 512-byte sectors
const SECTOR_SIZE: u64 = 512;

const SKIPPED_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "md", "sr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovableDevice {
    /// Kernel name, e.g. "sdb"
    pub name: String,
    /// Device node, e.g. "/dev/sdb"
    pub path: PathBuf,
    pub size_bytes: u64,
    pub model: String,
    /// Partition names, e.g. ["sdb1", "sdb2"]
    pub partitions: Vec<String>,
}

impl RemovableDevice {
    pub fn size_human(&self) -> String {
        let gb = self.size_bytes as f64 / 1_000_000_000.0;
        if gb >= 1.0 {
            format!("{:.1} GB", gb)
        } else {
            format!("{:.0} MB", self.size_bytes as f64 / 1_000_000.0)
        }
    }

    pub fn label(&self) -> String {
        if self.model.is_empty() {
            format!("{} ({})", self.path.display(), self.size_human())
        } else {
            format!("{} {} ({})", self.path.display(), self.model, self.size_human())
        }
    }

    /// Identifiers the device step can offer: partitions, or the disk itself
    pub fn targets(&self) -> Vec<String> {
        if self.partitions.is_empty() {
            vec![self.name.clone()]
        } else {
            self.partitions.clone()
        }
    }
}

/// Removable drives on this machine
pub fn list_removable() -> Result<Vec<RemovableDevice>> {
    scan(Path::new(SYS_BLOCK))
}

/// Scan a sysfs `block` directory
pub fn scan(sys_block: &Path) -> Result<Vec<RemovableDevice>> {
    let entries = fs::read_dir(sys_block)
        .with_context(|| format!("Failed to read {}", sys_block.display()))?;

    let mut devices = Vec::new();

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();

        if SKIPPED_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }

        let dir = entry.path();
        if read_attr(&dir.join("removable")).as_deref() != Some("1") {
            continue;
        }

        let sectors: u64 = read_attr(&dir.join("size"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        if sectors == 0 {
            // empty card reader slot
            continue;
        }

        devices.push(RemovableDevice {
            path: PathBuf::from("/dev").join(&name),
            size_bytes: sectors.saturating_mul(SECTOR_SIZE),
            model: read_attr(&dir.join("device").join("model")).unwrap_or_default(),
            partitions: partitions(&dir, &name),
            name,
        });
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!("Found {} removable device(s)", devices.len());

    Ok(devices)
}

fn partitions(dir: &Path, disk: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut parts: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().join("partition").exists())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with(disk))
        .collect();
    parts.sort();
    parts
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
