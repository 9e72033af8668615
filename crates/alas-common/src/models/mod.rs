pub mod future_token_pack;
pub mod get_token_request;
pub mod keep_alive_event;
pub mod mobile_event;
pub mod out_event;

pub use future_token_pack::{FutureToken, FutureTokenPack};
pub use get_token_request::GetTokenRequest;
pub use keep_alive_event::KeepAliveEvent;
pub use mobile_event::MobileEvent;
pub use out_event::OutEvent;
