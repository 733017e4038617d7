pub mod builder;
pub mod inscription;

pub use builder::SimulationBuilderExt;
pub use inscription::{
    InitStage, MintInitializer, MintInscription, MintInscriptionUser, MintSuccessExpectation,
};
