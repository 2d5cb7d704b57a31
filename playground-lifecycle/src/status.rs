use playground_core::{tools, ContainerStatus};

/// Live container state from `<runtime> inspect`. Never errors.
#[derive(Debug, Clone)]
pub struct StatusProber {
    runtime: String,
}

impl StatusProber {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    pub fn status(&self, container_id: &str) -> ContainerStatus {
        let Ok(runtime) = tools::resolve(&self.runtime) else {
            return ContainerStatus::Unknown;
        };
        match tools::run(
            &runtime,
            ["inspect", "-f", "{{.State.Running}}", container_id],
            None,
        ) {
            Ok(out) => parse_running(&out.stdout),
            Err(err) => {
                tracing::debug!(container = container_id, error = %err, "container inspect failed");
                ContainerStatus::Unknown
            }
        }
    }
}

fn parse_running(stdout: &str) -> ContainerStatus {
    match stdout.trim() {
        "true" => ContainerStatus::Running,
        "false" => ContainerStatus::Stopped,
        _ => ContainerStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inspect_output() {
        assert_eq!(parse_running("true\n"), ContainerStatus::Running);
        assert_eq!(parse_running(" false "), ContainerStatus::Stopped);
        assert_eq!(parse_running(""), ContainerStatus::Unknown);
        assert_eq!(parse_running("<no value>"), ContainerStatus::Unknown);
    }

    #[test]
    fn missing_runtime_is_unknown() {
        let prober = StatusProber::new("definitely-not-a-runtime-91c2");
        assert_eq!(prober.status("abc"), ContainerStatus::Unknown);
    }
}
