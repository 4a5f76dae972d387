pub mod accounts;
pub mod cars;
pub mod drivers;
pub mod health;
pub mod index;
pub mod manufacturers;
pub mod views;
