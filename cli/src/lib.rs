pub mod cleanup;
pub mod config;
pub mod logging;
pub mod privilege;
pub mod registry;
pub mod services;
pub mod uninstall;
