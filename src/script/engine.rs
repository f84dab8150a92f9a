// src/script/engine.rs — Sandboxed Rhai engine factory
//
// Plugin scripts run in an interpreter with no I/O. The host exposes
// logging; everything else a script needs arrives through its function
// arguments.

use rhai::Engine;

/// Create a Rhai engine with safety limits and the host logging functions.
pub fn create_script_engine() -> Engine {
    let mut engine = Engine::new();

    // Safety limits
    engine.set_max_expr_depths(64, 32);
    engine.set_max_operations(100_000);
    engine.set_max_string_size(1_048_576); // 1MB
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(10_000);

    // Logging into the process-wide sink
    engine.register_fn("log", |msg: &str| {
        tracing::info!(target: "plugin", "{}", msg);
    });
    engine.register_fn("log_debug", |msg: &str| {
        tracing::debug!(target: "plugin", "{}", msg);
    });
    engine.register_fn("log_warn", |msg: &str| {
        tracing::warn!(target: "plugin", "{}", msg);
    });

    // No filesystem access, no shell exec, no env vars
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_evaluates_expressions() {
        let engine = create_script_engine();
        let result: i64 = engine.eval("40 + 2").unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_engine_exposes_log() {
        let engine = create_script_engine();
        // Must not error even with no subscriber installed
        engine.eval::<()>(r#"log("hello")"#).unwrap();
        engine.eval::<()>(r#"log_warn("careful")"#).unwrap();
    }

    #[test]
    fn test_operations_limit_enforced() {
        let engine = create_script_engine();
        let result = engine.eval::<i64>("let x = 0; while true { x += 1 } x");
        assert!(result.is_err());
    }
}
