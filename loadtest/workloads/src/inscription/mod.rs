pub mod call;
pub mod expectation;
pub mod init;
pub mod user;

pub use call::{INSCRIBE_METHOD, INSCRIPTION_CONTRACT, MintInscription};
pub use expectation::MintSuccessExpectation;
pub use init::{InitError, InitStage, MintInitializer};
pub use user::{DEFAULT_MINT_AMOUNT, DEFAULT_TICK, MINT_LABEL, MintInscriptionUser};
