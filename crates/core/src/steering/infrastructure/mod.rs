pub mod constant_rate_controller;
pub mod controller_factory;
pub mod proportional_controller;
