//! Dotted four-tuple software versions, compared as a single base-100 integer.
//!
//! §6: "Version strings are dotted four-tuples, each component < 100,
//! optionally suffixed `-postN` (post ignored)."

use crate::core::error::{CoreError, Result};

/// This build's `software_version`, stamped into every snapshot it writes.
pub const CURRENT_VERSION: &str = "1.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(u64);

impl Version {
    pub fn parse(s: &str) -> Result<Version> {
        let base = s.split("-post").next().unwrap_or(s);
        let parts: Vec<&str> = base.split('.').collect();
        if parts.len() != 4 {
            return Err(CoreError::Internal(format!(
                "version {s:?} is not a dotted four-tuple"
            )));
        }
        let mut value: u64 = 0;
        for part in parts {
            let component: u64 = part
                .parse()
                .map_err(|_| CoreError::Internal(format!("version {s:?} has non-numeric component")))?;
            if component >= 100 {
                return Err(CoreError::Internal(format!(
                    "version {s:?} has a component >= 100"
                )));
            }
            value = value * 100 + component;
        }
        Ok(Version(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_component() {
        let a = Version::parse("1.2.3.4").unwrap();
        let b = Version::parse("1.2.3.5").unwrap();
        assert!(a < b);
    }

    #[test]
    fn post_suffix_ignored() {
        let a = Version::parse("1.2.3.4-post7").unwrap();
        let b = Version::parse("1.2.3.4").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_component_over_limit() {
        assert!(Version::parse("1.2.3.100").is_err());
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Version::parse("1.2.3").is_err());
    }
}
