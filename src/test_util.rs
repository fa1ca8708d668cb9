#![allow(missing_docs)]

use parking_lot::Once;

/// Initializes logging for tests.
pub(crate) fn init() {
    static SET_LOGGER_ONCE: Once = Once::new();
    SET_LOGGER_ONCE.call_once(env_logger::init);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

/// A component that owns heap memory, to observe drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);
