pub mod activities;
pub mod admins;
pub mod rooms;
