pub mod buffers;
pub mod cli;
pub mod compute;
pub mod error;
pub mod options;
pub mod report;
pub mod sweep;
pub mod timing;
pub mod topology;
pub mod transport;
