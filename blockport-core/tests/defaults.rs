use std::sync::Arc;

use blockport_core::{executor, BlockPort, Executor, ExecutorError, LocalExecutor, WorkerId};

// Kept as a single test: the default executor is process wide.
#[tokio::test]
async fn defaults_are_resolved_from_the_registry() {
    executor::clear_default();
    assert!(matches!(
        executor::default_executor().unwrap_err(),
        ExecutorError::NoDefault
    ));

    let custom: Arc<dyn Executor> = Arc::new(LocalExecutor::new(["custom"], 1));
    assert!(executor::set_default(custom.clone()).is_none());
    let port = BlockPort::from_defaults().unwrap();
    assert_eq!(port.executor().workers(), vec![WorkerId::from("custom")]);

    executor::clear_default();
    let port = BlockPort::from_defaults().unwrap();
    let registered = executor::default_executor().unwrap();
    assert_eq!(port.executor().workers(), registered.workers());
    assert!(!registered.workers().is_empty());

    assert!(blockport_core::logging::init());
    assert!(!blockport_core::logging::init());
}
