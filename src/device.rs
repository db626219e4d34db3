//! Camera and microphone discovery.
//!
//! Devices are enumerate-then-select: a provider lists what it can see and
//! the first device of the wanted kind wins. Failure to enumerate is logged
//! and yields an empty list; placeholders keep rendering.

use std::path::Path;

use crate::error::StudioResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    AudioInput,
    VideoInput,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

/// First device of the wanted kind, in enumeration order.
pub fn pick_default(devices: &[DeviceInfo], kind: DeviceKind) -> Option<&DeviceInfo> {
    devices.iter().find(|d| d.kind == kind)
}

pub trait DeviceProvider {
    fn enumerate(&self) -> StudioResult<Vec<DeviceInfo>>;
}

/// Device discovery against the local system: V4L2 nodes for cameras and
/// the PulseAudio default source for the microphone.
pub struct SystemDevices;

impl DeviceProvider for SystemDevices {
    fn enumerate(&self) -> StudioResult<Vec<DeviceInfo>> {
        let mut devices = scan_video_nodes(Path::new("/dev"));
        devices.push(DeviceInfo {
            id: "default".to_string(),
            label: "System default microphone".to_string(),
            kind: DeviceKind::AudioInput,
        });
        Ok(devices)
    }
}

fn scan_video_nodes(dev: &Path) -> Vec<DeviceInfo> {
    let entries = match std::fs::read_dir(dev) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot enumerate video devices in {}: {e}", dev.display());
            return Vec::new();
        }
    };

    let mut nodes: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| {
            name.strip_prefix("video")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        })
        .collect();
    nodes.sort();

    nodes
        .into_iter()
        .map(|name| DeviceInfo {
            id: format!("{}/{name}", dev.display()),
            label: format!("Camera ({name})"),
            kind: DeviceKind::VideoInput,
        })
        .collect()
}
