mod sequential;

pub use sequential::*;
