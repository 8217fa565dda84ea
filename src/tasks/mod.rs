//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod frame_loop;
pub mod notification_worker;

// Re-export main functions
pub use frame_loop::frame_loop_task;
pub use notification_worker::notification_worker_task;
