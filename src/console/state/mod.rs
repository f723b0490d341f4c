pub mod app_state;
pub mod commands;
pub mod events;
pub mod facets;

#[cfg(test)]
mod app_state_test;
