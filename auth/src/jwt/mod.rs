pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::Claims;
pub use claims::Scope;
pub use claims::TokenKind;
pub use errors::TokenError;
pub use handler::TokenService;
