pub mod archiver;
pub mod building;
pub mod consumer;
pub mod hub;
pub mod processor;
pub mod track;
pub mod village;
