//! Widget page objects built on [`ComponentPiece`](crate::component::ComponentPiece)
//!
//! Each widget owns one piece and exposes the handful of operations that
//! make sense for it. Anything else is reachable through `piece()`.

pub mod button;
pub mod numeric_input;
pub mod text_input;

pub use button::Button;
pub use numeric_input::NumericInput;
pub use text_input::TextInput;
