mod product;
mod token;
mod user;

pub use product::*;
pub use token::*;
pub use user::*;
