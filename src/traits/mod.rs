pub mod dispatcher;
pub mod hash;
pub mod membership;

pub use dispatcher::StageDispatcher;
pub use hash::HashFunction;
pub use membership::{Directory, MembershipSource};
