// Public modules
pub mod auth;
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod types;
pub mod validation;

pub use config::CoreConfig;

// Entry point for initialization
/// Initialize the library with the given configuration. This must be called
/// before any other function in the library; later calls are ignored.
pub fn initialize(config: CoreConfig) -> ffi::FFIResult<()> {
    globals::initialize(config)
}

/// Whether `initialize` has completed
pub fn is_initialized() -> bool {
    globals::is_initialized()
}
