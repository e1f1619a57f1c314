pub mod model;
pub mod validator;

pub use validator::TokenValidator;
