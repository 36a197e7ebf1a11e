//! CSV adapters: the command log the binary replays and the reports it prints.

pub mod command;
pub mod command_reader;
pub mod report_writer;
