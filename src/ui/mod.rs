pub mod layout;
pub mod time_display;
