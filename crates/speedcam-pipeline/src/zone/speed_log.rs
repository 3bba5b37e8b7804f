//! Speed log file: a JSON array of crossing events.

use super::tracker::CrossingEvent;
use crate::error::{Result, SpeedcamError};
use std::path::Path;

pub fn save_speed_log(path: &Path, events: &[CrossingEvent]) -> Result<()> {
    let text = serde_json::to_string_pretty(events)
        .map_err(|e| SpeedcamError::format(Some(path), e.to_string()))?;
    std::fs::write(path, text).map_err(|e| SpeedcamError::io(path, e))?;
    log::info!("wrote {} speed log entries to {}", events.len(), path.display());
    Ok(())
}

pub fn load_speed_log(path: &Path) -> Result<Vec<CrossingEvent>> {
    let text = std::fs::read_to_string(path).map_err(|e| SpeedcamError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| SpeedcamError::format(Some(path), e.to_string()))
}
