use anyhow::{bail, Context, Result};
use gbf_data::config::DeviceSettings;
use image::RgbaImage;
use std::process::Command;
use tracing::debug;

/// Thin wrapper over the `adb` binary for one device
#[derive(Debug, Clone)]
pub struct Adb {
    path: String,
    serial: Option<String>,
}

impl Adb {
    pub fn new(path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            path: path.into(),
            serial,
        }
    }

    pub fn from_settings(device: &DeviceSettings) -> Self {
        Self::new(device.adb_path.clone(), device.serial.clone())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    /// Run `adb exec-out <args>` and return raw stdout
    pub fn exec_out(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self
            .command()
            .arg("exec-out")
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {} exec-out {}", self.path, args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "adb exec-out {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }

    /// Run `adb shell <args>` and return trimmed stdout
    pub fn shell(&self, args: &[&str]) -> Result<String> {
        let output = self
            .command()
            .arg("shell")
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {} shell {}", self.path, args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "adb shell {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("adb shell {} -> {:?}", args.join(" "), stdout);
        Ok(stdout)
    }

    pub fn screencap(&self) -> Result<RgbaImage> {
        let png = self.exec_out(&["screencap", "-p"])?;
        let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .context("Failed to decode screencap PNG")?;
        Ok(img.to_rgba8())
    }

    pub fn screen_size(&self) -> Result<(u32, u32)> {
        let out = self.shell(&["wm", "size"])?;
        parse_wm_size(&out).with_context(|| format!("Unexpected `wm size` output: {}", out))
    }

    pub fn density(&self) -> Result<u32> {
        let out = self.shell(&["wm", "density"])?;
        parse_wm_density(&out).with_context(|| format!("Unexpected `wm density` output: {}", out))
    }
}

/// Value for `key` in `wm` output, preferring the override line
fn wm_value<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    let find = |prefix: &str| {
        output
            .lines()
            .find_map(|l| l.trim().strip_prefix(prefix).map(str::trim))
    };
    find(&format!("Override {}:", key)).or_else(|| find(&format!("Physical {}:", key)))
}

fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let (w, h) = wm_value(output, "size")?.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn parse_wm_density(output: &str) -> Option<u32> {
    wm_value(output, "density")?.parse().ok()
}
