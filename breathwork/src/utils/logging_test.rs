#[cfg(test)]
mod tests {
    use super::super::logging::{init_logging, DEFAULT_FILTER};
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_logging_initialization_is_idempotent() {
        init_logging();
        init_logging();
        tracing::debug!("still logging after a second init");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
