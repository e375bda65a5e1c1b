use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create output file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .map_err(|err| format!("Failed to serialize JSON '{}': {err}", path.display()))?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize output file '{}': {err}", path.display()))?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value)
        .map_err(|err| format!("Failed to serialize JSON to stdout: {err}"))?;
    lock.write_all(b"\n")
        .map_err(|err| format!("Failed to write to stdout: {err}"))?;
    Ok(())
}
