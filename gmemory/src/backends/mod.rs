pub(crate) mod filesystem;
pub(crate) mod sqlite;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gchat::MessageRole;

use crate::error::MemoryError;

pub(crate) fn encode_system_time(value: SystemTime) -> Result<(i64, i64), MemoryError> {
    let duration = value.duration_since(UNIX_EPOCH).map_err(|error| {
        MemoryError::invalid_request(format!("timestamp predates unix epoch: {error}"))
    })?;
    Ok((
        duration.as_secs() as i64,
        i64::from(duration.subsec_nanos()),
    ))
}

pub(crate) fn decode_system_time(seconds: i64, nanos: i64) -> Result<SystemTime, MemoryError> {
    if seconds < 0 {
        return Err(MemoryError::storage(format!(
            "timestamp seconds must be non-negative, got {seconds}"
        )));
    }
    if !(0..1_000_000_000).contains(&nanos) {
        return Err(MemoryError::storage(format!(
            "timestamp nanos must be in [0, 1_000_000_000), got {nanos}"
        )));
    }
    Ok(UNIX_EPOCH + Duration::new(seconds as u64, nanos as u32))
}

pub(crate) fn role_from_str(value: &str) -> Result<MessageRole, MemoryError> {
    MessageRole::parse(value).ok_or_else(|| {
        MemoryError::storage(format!("unknown transcript role value '{value}'"))
    })
}
