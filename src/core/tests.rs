//! Two-session tests over a simulated link, without any runtime.
