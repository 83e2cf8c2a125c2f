//! Signal processors (inputs → outputs)

mod ema;
mod envelope;
mod jitter;
mod subtract;

pub use ema::Ema;
pub use envelope::Adsr;
pub use jitter::Jitter;
pub use subtract::Subtract;
