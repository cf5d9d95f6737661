pub mod passwords;
pub mod sessions;
pub mod token;
pub mod verification;
