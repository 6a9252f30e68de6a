pub mod series;

pub use series::{router, start_server, AppState};
