mod compute;
mod layout;
mod shader;

pub use compute::*;
pub use layout::*;
pub use shader::*;
