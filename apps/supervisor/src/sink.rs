use anyhow::{Context, Result};
use std::fs::{rename, File};
use std::io::Write;
use std::path::PathBuf;

/// Destination of the flow temperature setpoint (the controller bridge).
pub trait SetpointSink: Send {
    fn write_setpoint(&mut self, flow_temperature: f64) -> Result<()>;
}

/// Writes `SET flow = <deci-degrees>` for the controller bridge to pick up.
///
/// The file is written next to the target and renamed over it, so readers
/// never see a partial line.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".new");
        self.path.with_file_name(name)
    }
}

impl SetpointSink for FileSink {
    fn write_setpoint(&mut self, flow_temperature: f64) -> Result<()> {
        let tmp = self.tmp_path();
        let mut file =
            File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        writeln!(file, "SET flow = {:.0}", flow_temperature * 10.0)
            .with_context(|| format!("writing {}", tmp.display()))?;
        drop(file);
        rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} to {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}
