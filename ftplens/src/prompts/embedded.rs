//! Embedded prompts
//!
//! Compiled into the binary from the .pmt files under `prompts/`.

use tracing::debug;

/// Security analyst persona
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Report request wrapping the reduced log
pub const REPORT: &str = include_str!("../../prompts/report.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "report" => Some(REPORT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_system() {
        let system = get_embedded("system").unwrap();
        assert!(system.contains("SOC analyst"));
    }

    #[test]
    fn test_get_embedded_report() {
        let report = get_embedded("report").unwrap();
        assert!(report.contains("<logs>\n{{logs}}\n</logs>"));
        assert!(report.contains("Executive Summary"));
        assert!(report.contains("Indicators of Compromise"));
        assert!(report.contains("Event Timeline"));
        assert!(report.contains("Immediate Remediation"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
