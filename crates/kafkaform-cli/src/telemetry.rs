use std::io::IsTerminal;

use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow the configured level. Everything else, the
/// HTTP stack included, stays at `warn`.
const KAFKAFORM_TARGETS: [&str; 5] = [
    "kafkaform",
    "kafkaform_acl",
    "kafkaform_client",
    "kafkaform_config",
    "kafkaform_provisioner",
];

/// Install the stderr subscriber. `RUST_LOG` wins over `log_level`.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));
    let stderr = std::io::stderr();

    fmt()
        .with_env_filter(filter)
        .with_ansi(stderr.is_terminal())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_directives(log_level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(KAFKAFORM_TARGETS.iter().map(|target| format!("{target}={log_level}")));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_level_to_own_crates() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("kafkaform_client=debug"));
        assert!(directives.contains("kafkaform_provisioner=debug"));
        assert!(!directives.contains("reqwest"));
        EnvFilter::try_new(&directives).unwrap();
    }
}
