pub mod lifecycle;
pub mod locks;
pub mod validation;
