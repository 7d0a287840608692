pub mod agent;
pub mod artifact;
pub mod common;
pub mod init;
pub mod phase;
pub mod publish;
pub mod status;
pub mod task;
