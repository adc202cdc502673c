mod common;
mod helpers;

use helpers::env::ScopedEnv;
use efivarstore::constants::ENV_ROOT_OVERRIDE;
use efivarstore::{select_store, EfivarfsStore, VarError, VariableStore};
use serial_test::serial;

// The process-wide root is resolved once, so everything that depends on the
// environment at first use lives in this one test binary.

#[test]
#[serial]
fn env_override_sets_the_root_and_passes_the_probe() {
    let td = tempfile::tempdir().unwrap();
    let _env = ScopedEnv::set(ENV_ROOT_OVERRIDE, td.path());

    let store = EfivarfsStore::new();
    assert_eq!(store.root(), td.path());
    assert!(store.probe().is_ok());

    let stores: Vec<Box<dyn VariableStore>> = vec![Box::new(store)];
    let chosen = select_store(&stores).map(|s| s.name());
    assert_eq!(chosen, Some("efivarfs"));
}

#[test]
#[serial]
fn other_directories_still_fail_the_probe() {
    let td = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let _env = ScopedEnv::set(ENV_ROOT_OVERRIDE, td.path());

    let store = EfivarfsStore::with_root(elsewhere.path());
    assert!(matches!(store.probe(), Err(VarError::NotEfivarfs { .. })));
}
