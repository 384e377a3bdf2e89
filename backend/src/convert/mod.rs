//! File conversion domain: remote client, attempt state, flow controller

mod attempt;
mod client;
mod error;
mod flow;

pub use attempt::{AttemptStatus, AttemptUpdate, AttemptView, ConversionAttempt};
pub use client::{ConversionResponse, ConvertClient, OutputFile};
pub use error::ConvertError;
pub use flow::ConversionFlow;
