//! Terminal front end

pub mod calc;
pub mod prices;
pub mod setup;
pub mod ui;
