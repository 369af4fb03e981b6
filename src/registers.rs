mod float;
mod integer;

pub(crate) use float::FloatRegister;
pub(crate) use integer::{RGroupRegisterID, RGroupRegisters};
