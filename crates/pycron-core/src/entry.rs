//! Crontab entry specs and the pure builder.
//!
//! A [`CronEntrySpec`] is an immutable value: an Update holds independent
//! `old` and `new` specs side by side without shared mutable state.

use std::path::{Path, PathBuf};

use crate::error::PycronError;

/// Validated spec for one managed crontab entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronEntrySpec {
    interval: u32,
    command: String,
}

impl CronEntrySpec {
    /// Script mode: `<interpreter> <script>`. The script path must exist.
    pub fn script(
        interval: u32,
        interpreter: &Path,
        script: &Path,
    ) -> Result<Self, PycronError> {
        validate_interval(interval)?;
        validate_path(script)?;
        Ok(Self {
            interval,
            command: format!("{} {}", interpreter.display(), script.display()),
        })
    }

    /// Module mode: `cd <dir> && <interpreter> -m <module>`. The module
    /// directory must exist; the module itself is resolved by the
    /// interpreter at run time.
    pub fn module(
        interval: u32,
        interpreter: &Path,
        dir: &Path,
        module: &str,
    ) -> Result<Self, PycronError> {
        validate_interval(interval)?;
        validate_path(dir)?;
        Ok(Self {
            interval,
            command: format!("cd {} && {} -m {}", dir.display(), interpreter.display(), module),
        })
    }

    /// Pre-resolved command: no path check, interval still validated.
    pub fn from_command(interval: u32, command: impl Into<String>) -> Result<Self, PycronError> {
        validate_interval(interval)?;
        Ok(Self {
            interval,
            command: command.into(),
        })
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Render the canonical entry line. Pure formatting, computed on
    /// demand and never cached.
    pub fn build(&self) -> String {
        format!("*/{} * * * * {}", self.interval, self.command)
    }
}

/// Fails unless `0 <= interval <= 59`.
pub fn validate_interval(interval: u32) -> Result<(), PycronError> {
    if interval > 59 {
        return Err(PycronError::IntervalOutOfRange(interval.to_string()));
    }
    Ok(())
}

/// Parse a raw CLI interval value and range-check it.
pub fn parse_interval(raw: &str) -> Result<u32, PycronError> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| PycronError::IntervalOutOfRange(raw.to_string()))?;
    if !(0..=59).contains(&n) {
        return Err(PycronError::IntervalOutOfRange(raw.to_string()));
    }
    Ok(n as u32)
}

/// Fails unless the path exists on the filesystem.
pub fn validate_path(path: &Path) -> Result<(), PycronError> {
    if !path.exists() {
        return Err(PycronError::PathNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Split a module-mode PATH argument into `(directory, module name)`.
/// Anything other than exactly two whitespace-separated tokens is malformed.
pub fn split_module_request(raw: &str) -> Result<(PathBuf, String), PycronError> {
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(dir), Some(name), None) => Ok((PathBuf::from(dir), name.to_string())),
        _ => Err(PycronError::MalformedModuleRequest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(0).is_ok());
        assert!(validate_interval(59).is_ok());
        assert!(matches!(
            validate_interval(60),
            Err(PycronError::IntervalOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_interval_rejects_garbage() {
        assert_eq!(parse_interval("5").unwrap(), 5);
        assert_eq!(parse_interval(" 59 ").unwrap(), 59);
        assert!(parse_interval("60").is_err());
        assert!(parse_interval("-1").is_err());
        assert!(parse_interval("five").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path(&existing_path()).is_ok());
        assert!(matches!(
            validate_path(Path::new("/definitely/not/here.py")),
            Err(PycronError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_script_build() {
        let script = existing_path();
        let spec = CronEntrySpec::script(5, Path::new("/usr/bin/python3"), &script).unwrap();
        assert_eq!(
            spec.build(),
            format!("*/5 * * * * /usr/bin/python3 {}", script.display())
        );
    }

    #[test]
    fn test_script_rejects_missing_script() {
        let err = CronEntrySpec::script(5, Path::new("/usr/bin/python3"), Path::new("/gone.py"));
        assert!(matches!(err, Err(PycronError::PathNotFound(_))));
    }

    #[test]
    fn test_module_build() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let spec = CronEntrySpec::module(10, Path::new("/usr/bin/python3"), dir, "jobs.finder")
            .unwrap();
        assert_eq!(
            spec.build(),
            format!(
                "*/10 * * * * cd {} && /usr/bin/python3 -m jobs.finder",
                dir.display()
            )
        );
    }

    #[test]
    fn test_from_command_skips_path_check() {
        let spec = CronEntrySpec::from_command(3, "cd /srv/app && py -m job").unwrap();
        assert_eq!(spec.build(), "*/3 * * * * cd /srv/app && py -m job");
        assert!(CronEntrySpec::from_command(60, "x").is_err());
    }

    #[test]
    fn test_old_and_new_specs_are_independent() {
        let script = existing_path();
        let old = CronEntrySpec::script(5, Path::new("/usr/bin/python3"), &script).unwrap();
        let new = CronEntrySpec::script(30, Path::new("/usr/bin/python3"), &script).unwrap();
        // Building `new` must not disturb the already-held `old` value.
        assert_eq!(old.interval(), 5);
        assert_ne!(old.build(), new.build());
    }

    #[test]
    fn test_split_module_request() {
        let (dir, name) = split_module_request("/srv/app jobs.finder").unwrap();
        assert_eq!(dir, PathBuf::from("/srv/app"));
        assert_eq!(name, "jobs.finder");
        assert!(matches!(
            split_module_request("/srv/app"),
            Err(PycronError::MalformedModuleRequest)
        ));
        assert!(matches!(
            split_module_request("/srv/app jobs extra"),
            Err(PycronError::MalformedModuleRequest)
        ));
    }
}
