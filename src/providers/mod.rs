pub mod metals_api;
pub mod util;

pub use metals_api::MetalsApiProvider;
