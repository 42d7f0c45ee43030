// Services layer - Business logic and orchestration
pub mod account_service;
pub mod id_codec;
pub mod token_service;

pub use account_service::{AccountService, Registration};
pub use id_codec::IdCodec;
pub use token_service::{TokenService, VerifiedToken, DEFAULT_TOKEN_TTL_SECONDS};
