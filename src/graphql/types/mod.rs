pub mod account;
pub mod comment;
pub mod post;

pub use account::Account;
pub use comment::Comment;
pub use post::Post;
