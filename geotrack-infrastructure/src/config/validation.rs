use anyhow::{anyhow, Result};

pub const MAX_WORKERS: usize = 64;
pub const LOG_FORMATS: [&str; 2] = ["text", "json"];

pub fn validate_positive_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(anyhow!("{} must be a positive number, got {}", name, value));
    }
    Ok(())
}

pub fn validate_log_format(value: &str) -> Result<()> {
    if !LOG_FORMATS.contains(&value) {
        return Err(anyhow!("log_format must be one of {:?}", LOG_FORMATS));
    }
    Ok(())
}
