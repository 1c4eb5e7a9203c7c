//! This module collects functionality specific to the supported element types.

/// Module for defining [ElementType]
pub mod element_type;
pub use element_type::ElementType;
/// Module for defining [ElementValue]
pub mod element_value;
pub use element_value::ElementValue;
/// Module for defining [ElementVec]
pub mod element_vec;
pub use element_vec::ElementVec;
