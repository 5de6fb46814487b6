/// Implementation using a damped Newton iteration with a bracketing fallback
pub mod newton;

/// Implementation using Brent's bracketing method
pub mod brent;
