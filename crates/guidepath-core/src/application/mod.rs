/// Flow execution controller
pub mod execution_controller;
