//! BDD step definitions for the Barfik client

pub mod refresh_steps;
pub mod shopping_steps;
pub mod validation_steps;
pub mod view_steps;
