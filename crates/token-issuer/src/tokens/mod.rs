//! Token lifecycle: configuration, claim construction, signing and reading.
//!
//! ```text
//! login/renewal -> build_claims -> sign_token -> compact JWT
//! compact JWT   -> read_token (Enforce | Ignore) -> DecodedToken
//! ```

pub mod claims;
pub mod issuer_config;
pub mod reader;
pub mod signer;

pub use claims::{build_claims, build_claims_at, ClaimSet};
pub use issuer_config::{
    IssuerConfig, IssuerConfigBuilder, JtiGenerator, NotBeforePolicy, UuidJtiGenerator,
};
pub use reader::{read_token, read_token_at, DecodedToken, ExpirationPolicy};
pub use signer::sign_token;
