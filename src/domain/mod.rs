pub mod role;
pub mod user;
pub mod announcement;
pub mod engagement;
pub mod timestamp;
pub mod visibility;
pub mod ranking;

pub use role::*;
pub use user::*;
pub use announcement::*;
pub use engagement::*;
pub use timestamp::{parse_optional_timestamp, parse_timestamp};
pub use visibility::*;
pub use ranking::*;
