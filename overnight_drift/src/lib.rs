pub mod chart;
pub mod cli;
pub mod drift;
pub mod obs;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod settings;
pub mod tz;
pub mod window;
