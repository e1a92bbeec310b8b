pub mod notification;
pub mod price;
pub mod signals;
pub mod ws;

pub use notification::*;
pub use price::*;
pub use signals::*;
pub use ws::*;
