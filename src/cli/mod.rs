pub mod prices;
pub mod record;
pub mod report;
pub mod setup;
pub mod ui;
pub mod watch;
