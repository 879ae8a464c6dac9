pub mod controller;
pub mod energy_mode;
pub mod measurement;
pub mod night;
pub mod operating_mode;
pub mod poll_loop;
pub mod reported;
pub mod settings;
pub mod surplus;
pub mod throttle;
