pub mod errors;
pub mod json;
pub mod report;

pub use errors::{error_to_response, ResultResp};

pub use json::{json_created, json_ok};
pub use report::report_response;
