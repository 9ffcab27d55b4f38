//! Process-wide schema configured from the environment
//!
//! Kept in its own test binary: the global schema can only be set once per
//! process.

use std::env;

use elif_reflection::{
    global, try_global, ConfigError, ForeignKeyConvention, ReflectionError,
    ENV_FOREIGN_KEY_CONVENTION,
};

#[test]
fn test_try_global_reports_invalid_environment() {
    env::set_var(ENV_FOREIGN_KEY_CONVENTION, "kebab");
    let err = try_global().unwrap_err();
    assert!(matches!(
        err,
        ReflectionError::Config(ConfigError::InvalidValue { .. })
    ));

    // A rejected configuration leaves the global schema unset
    env::set_var(ENV_FOREIGN_KEY_CONVENTION, "camel_case");
    let schema = try_global().unwrap();
    assert_eq!(
        schema.config().foreign_key_convention,
        ForeignKeyConvention::CamelCase
    );
    assert!(std::ptr::eq(schema, global()));

    env::remove_var(ENV_FOREIGN_KEY_CONVENTION);
}
