pub mod config_io;
pub mod gateway;
pub mod logging;
pub mod worker;
