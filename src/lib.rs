pub mod cli;
pub mod commands;
pub mod downloader;
pub mod logging;
